//! Runtime for the protocol language.
//!
//! - **`environment`**: scopes, delegation and statement execution entry points
//! - **`eval`**: expression evaluation and statement execution
//! - **`closure`**: user-defined functions
//! - **`arrays`** / **`ranges`**: the array expression kinds and range decoding
//! - **`model`**: exposing simulation model variables as a scope
//! - **`library`**: standard library functions
//! - **`stack`**: on-demand stack growth for deep recursion

pub mod arrays;
pub mod closure;
pub mod environment;
pub mod eval;
pub mod library;
pub mod model;
pub mod ranges;
pub mod stack;

pub use closure::Closure;
pub use environment::{Environment, Scope, WeakEnvironment};
pub use eval::{EvalOptions, EvaluationContext};
pub use model::{ModelWrapper, ParameterisedModel, VariableTable};
