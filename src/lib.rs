//! # Protocore
//!
//! The evaluation core of a protocol language for simulation experiments:
//! n-dimensional arrays with zero-copy views, scoped environments with
//! prefix delegation, closures, MathML-style operators, and errors that carry
//! a backtrace of source locations.
//!
//! Expression trees come from a parser outside this crate (see [`ast`]), are
//! evaluated against an [`runtime::Environment`], and results are read back
//! through [`engine::Engine`].

pub use crate::diagnostics::{ErrorContext, ErrorType, ProtoError};

pub mod array;
pub mod ast;
pub mod atoms;
pub mod diagnostics;
pub mod engine;
pub mod runtime;
pub mod value;

pub use crate::array::{NdArray, Range};
pub use crate::value::Value;
