//! Shared infrastructure for operator atoms: operand extraction and arity checks.

use crate::ast::Location;
use crate::diagnostics::ProtoError;
use crate::proto_err;
use crate::value::Value;

/// Extracts every operand as a number.
///
/// Fails with "`<label>` operator requires its operands to be simple values."
pub fn numbers(args: &[Value], label: &str, location: &Location) -> Result<Vec<f64>, ProtoError> {
    args.iter()
        .map(|arg| {
            arg.as_number().ok_or_else(|| {
                proto_err!(
                    KindMismatch,
                    location,
                    "{label} operator requires its operands to be simple values."
                )
            })
        })
        .collect()
}

/// Extracts the single operand of a unary operator as a number.
pub fn unary(args: &[Value], label: &str, location: &Location) -> Result<f64, ProtoError> {
    args.first().and_then(Value::as_number).ok_or_else(|| {
        proto_err!(
            KindMismatch,
            location,
            "{label} operator requires its operand to be a simple value."
        )
    })
}

/// Extracts the operand and optional leading qualifier (degree, log base).
pub fn qualified(
    args: &[Value],
    label: &str,
    location: &Location,
) -> Result<(f64, Option<f64>), ProtoError> {
    let operand = args.last().and_then(Value::as_number).ok_or_else(|| {
        proto_err!(
            KindMismatch,
            location,
            "{label} operator requires its operand to be a simple value."
        )
    })?;
    if args.len() < 2 {
        return Ok((operand, None));
    }
    let qualifier = args[0].as_number().ok_or_else(|| {
        proto_err!(
            KindMismatch,
            location,
            "{label} operator requires its qualifier to be a simple value."
        )
    })?;
    Ok((operand, Some(qualifier)))
}

/// Extracts exactly two numeric operands.
pub fn binary(args: &[Value], label: &str, location: &Location) -> Result<(f64, f64), ProtoError> {
    let values = numbers(args, label, location)?;
    match values.as_slice() {
        [a, b] => Ok((*a, *b)),
        _ => Err(proto_err!(Arity, location, "{label} operator requires 2 operands.")),
    }
}

/// Numeric truth: any non-zero value is true.
pub fn truthy(x: f64) -> bool {
    x != 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    #[test]
    fn numbers_rejects_non_numbers() {
        let loc = Location::default();
        let err = numbers(&[Value::Number(1.0), Value::Null], "Plus", &loc).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::KindMismatch);
        assert_eq!(err.message(), "Plus operator requires its operands to be simple values.");
    }

    #[test]
    fn qualified_reads_leading_qualifier() {
        let loc = Location::default();
        let args = [Value::Number(3.0), Value::Number(27.0)];
        assert_eq!(qualified(&args, "Root", &loc).unwrap(), (27.0, Some(3.0)));
        assert_eq!(qualified(&args[1..], "Root", &loc).unwrap(), (27.0, None));
    }
}
