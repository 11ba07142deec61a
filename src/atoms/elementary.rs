//! # Elementary Functions
//!
//! Exponentials, logarithms and the trigonometric family.
//!
//! Reciprocal functions (`sec`, `csch`, ...) are computed as `1 / f(x)`, and
//! their inverses (`arcsec`, `arccsch`, ...) as `f⁻¹(1 / x)`.

use crate::atoms::helpers::{qualified, unary};
use crate::atoms::PureAtomFn;
use crate::value::Value;

/// Defines a unary atom applying `$f` to its single operand.
macro_rules! unary_atom {
    ($(#[$doc:meta])* $name:ident, $label:expr, $f:expr) => {
        $(#[$doc])*
        pub const $name: PureAtomFn = |args, loc| {
            let x = unary(args, $label, loc)?;
            let f: fn(f64) -> f64 = $f;
            Ok(Value::Number(f(x)))
        };
    };
}

unary_atom!(
    /// e raised to the operand.
    ATOM_EXP, "Exponential", f64::exp
);
unary_atom!(ATOM_LN, "Natural logarithm", f64::ln);

/// Base-10 logarithm, or the logarithm to a base given as a leading qualifier.
///
/// Example:
///   (log 100)   ; => 2
///   (log 2 8)   ; => 3
pub const ATOM_LOG: PureAtomFn = |args, loc| {
    let (operand, base) = qualified(args, "Logarithm", loc)?;
    let result = match base {
        Some(b) if b != 10.0 => operand.ln() / b.ln(),
        _ => operand.log10(),
    };
    Ok(Value::Number(result))
};

unary_atom!(ATOM_SIN, "Sin", f64::sin);
unary_atom!(ATOM_COS, "Cos", f64::cos);
unary_atom!(ATOM_TAN, "Tan", f64::tan);
unary_atom!(ATOM_SEC, "Sec", |x| 1.0 / x.cos());
unary_atom!(ATOM_CSC, "Csc", |x| 1.0 / x.sin());
unary_atom!(ATOM_COT, "Cot", |x| 1.0 / x.tan());

unary_atom!(ATOM_SINH, "Sinh", f64::sinh);
unary_atom!(ATOM_COSH, "Cosh", f64::cosh);
unary_atom!(ATOM_TANH, "Tanh", f64::tanh);
unary_atom!(ATOM_SECH, "Sech", |x| 1.0 / x.cosh());
unary_atom!(ATOM_CSCH, "Csch", |x| 1.0 / x.sinh());
unary_atom!(ATOM_COTH, "Coth", |x| 1.0 / x.tanh());

unary_atom!(ATOM_ARCSIN, "ArcSin", f64::asin);
unary_atom!(ATOM_ARCCOS, "ArcCos", f64::acos);
unary_atom!(ATOM_ARCTAN, "ArcTan", f64::atan);
unary_atom!(ATOM_ARCSEC, "ArcSec", |x| (1.0 / x).acos());
unary_atom!(ATOM_ARCCSC, "ArcCsc", |x| (1.0 / x).asin());
unary_atom!(ATOM_ARCCOT, "ArcCot", |x| (1.0 / x).atan());

unary_atom!(ATOM_ARCSINH, "ArcSinh", f64::asinh);
unary_atom!(ATOM_ARCCOSH, "ArcCosh", f64::acosh);
unary_atom!(ATOM_ARCTANH, "ArcTanh", f64::atanh);
unary_atom!(ATOM_ARCSECH, "ArcSech", |x| (1.0 / x).acosh());
unary_atom!(ATOM_ARCCSCH, "ArcCsch", |x| (1.0 / x).asinh());
unary_atom!(ATOM_ARCCOTH, "ArcCoth", |x| (1.0 / x).atanh());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;

    fn run(atom: PureAtomFn, args: &[f64]) -> f64 {
        let values: Vec<Value> = args.iter().map(|n| Value::Number(*n)).collect();
        atom(&values, &Location::default()).unwrap().as_number().unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn logarithms() {
        assert!(close(run(ATOM_LOG, &[100.0]), 2.0));
        assert!(close(run(ATOM_LOG, &[2.0, 8.0]), 3.0));
        assert!(close(run(ATOM_LN, &[run(ATOM_EXP, &[1.5])]), 1.5));
    }

    #[test]
    fn reciprocal_trig() {
        let x = 0.3;
        assert!(close(run(ATOM_SEC, &[x]), 1.0 / x.cos()));
        assert!(close(run(ATOM_COTH, &[x]), 1.0 / x.tanh()));
        assert!(close(run(ATOM_ARCSEC, &[run(ATOM_SEC, &[x])]), x));
        assert!(close(run(ATOM_ARCCOT, &[2.0]), 0.5f64.atan()));
    }

    #[test]
    fn unary_message_names_operator() {
        let err = ATOM_TANH(&[Value::Null], &Location::default()).unwrap_err();
        assert_eq!(err.message(), "Tanh operator requires its operand to be a simple value.");
    }
}
