//! Standard library functions, written in the protocol language itself.
//!
//! `diff(array, dim)`: differences of successive elements along `dim`
//! (default: the last dimension), one shorter than `array` along it.
//!
//! ```text
//! def diff(array, dim=default):
//!     assert array.IS_ARRAY
//!     dim = if dim'.IS_DEFAULT then array.NUM_DIMS - 1 else dim'
//!     assert dim.IS_SIMPLE_VALUE
//!     assert dim < array.NUM_DIMS
//!     return map(minus, array[dim$1:], array[dim$:-1])
//! ```

use crate::ast::builder::*;
use crate::ast::{Attribute, Constant, ExprNode, StatementNode};
use crate::atoms::Operator;
use crate::diagnostics::ProtoError;
use crate::runtime::environment::Environment;

const LIBRARY_LOCATION: &str = "<library>";

/// Defines every library function in `env`.
pub fn define_all(env: &Environment) -> Result<(), ProtoError> {
    env.execute_statement(&diff_definition()).map(|_| ())
}

fn diff_definition() -> StatementNode {
    let default_dim = apply(
        Operator::Minus,
        vec![accessor(lookup("array"), Attribute::NumDims), num(1.0)],
    );
    let dim = if_expr(
        accessor(lookup("dim'"), Attribute::IsDefault),
        default_dim,
        lookup("dim'"),
    );
    let later = view(
        lookup("array"),
        vec![
            dim_range_expr(lookup("dim"), Some(1.0), None),
            dim_range(None, None, 1.0, None),
        ],
    );
    let earlier = view(
        lookup("array"),
        vec![
            dim_range_expr(lookup("dim"), Some(0.0), Some(-1.0)),
            dim_range(None, None, 1.0, None),
        ],
    );
    let body = vec![
        assert_stmt(accessor(lookup("array"), Attribute::IsArray)),
        assign("dim", dim),
        assert_stmt(accessor(lookup("dim"), Attribute::IsSimpleValue)),
        assert_stmt(apply(
            Operator::Lt,
            vec![lookup("dim"), accessor(lookup("array"), Attribute::NumDims)],
        )),
        ret(map(wrap(Operator::Minus, 2), vec![later, earlier])),
    ];
    let located: Vec<StatementNode> = body
        .into_iter()
        .map(|s| s.located(format!("{LIBRARY_LOCATION} diff")))
        .collect();
    let function = lambda_with_defaults(&["array", "dim'"], located, vec![None, Some(Constant::Default)])
        .located(format!("{LIBRARY_LOCATION} diff"));
    assign("diff", function).located(LIBRARY_LOCATION)
}

// A (dim, start, 1, end) range whose dimension is computed.
fn dim_range_expr(dim: ExprNode, start: Option<f64>, end: Option<f64>) -> ExprNode {
    let bound = |b: Option<f64>| b.map_or_else(null, num);
    tuple(vec![dim, bound(start), num(1.0), bound(end)])
}
