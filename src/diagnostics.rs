//! # Diagnostics
//!
//! This module defines the unified, `miette`-based error type for the protocol
//! language core. Every failure raised while looking up names, evaluating
//! expressions, executing statements or manipulating arrays is a `ProtoError`.
//!
//! ## Error Construction Macros
//!
//! - **Use `proto_err!` to build an error at a source location.**
//!   - `proto_err!(KindMismatch, &loc, "The test in an if expression must be a simple value.")`
//!
//! - **Use `proto_ensure!` for precondition checks that return early.**
//!   - `proto_ensure!(n > 0, Shape, &loc, "Cannot create an empty array.")`
//!
//! ## Backtraces
//!
//! An error raised deep inside an evaluation is wrapped in
//! `ProtoError::Propagated` each time it crosses a call boundary (statement
//! execution, function call, closure invocation). Use the `Propagate` trait
//! (`result.at(&location)`) to do so. `ProtoError::backtrace` flattens the chain
//! into frames, innermost first.

use std::fmt::Write as _;

use miette::Diagnostic;
use thiserror::Error;

use crate::array::ArrayError;
use crate::ast::Location;

/// Type-safe error classification, one entry per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// A name was not found locally or through any delegation path
    Unbound,
    /// A name was defined twice in one environment
    Rebinding,
    /// Overwrite attempted where no environment permits it
    OverwriteNotPermitted,
    /// A prefixed name whose prefix has no delegatee
    UnknownPrefix,
    /// A value of the wrong kind was supplied
    KindMismatch,
    /// Incompatible shapes, out-of-range indices, bad range specifications
    Shape,
    /// Wrong number of arguments or operands
    Arity,
    /// An assert statement failed
    Assertion,
    /// Interpreter limits and broken invariants
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Unbound => "Unbound",
            ErrorType::Rebinding => "Rebinding",
            ErrorType::OverwriteNotPermitted => "OverwriteNotPermitted",
            ErrorType::UnknownPrefix => "UnknownPrefix",
            ErrorType::KindMismatch => "KindMismatch",
            ErrorType::Shape => "Shape",
            ErrorType::Arity => "Arity",
            ErrorType::Assertion => "Assertion",
            ErrorType::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location and optional help attached to the construct that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    pub location: Location,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn at(location: &Location) -> Self {
        Self {
            location: location.clone(),
            help: None,
        }
    }
}

/// One entry of a flattened backtrace.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktraceFrame {
    pub message: String,
    pub location: Location,
}

/// Unified error type for all protocol core failure modes.
#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("Unbound name: {message}")]
    Unbound { message: String, ctx: ErrorContext },
    #[error("Rebinding conflict: {message}")]
    Rebinding { message: String, ctx: ErrorContext },
    #[error("Overwrite not permitted: {message}")]
    OverwriteNotPermitted { message: String, ctx: ErrorContext },
    #[error("Unknown prefix: {message}")]
    UnknownPrefix { message: String, ctx: ErrorContext },
    #[error("Kind mismatch: {message}")]
    KindMismatch { message: String, ctx: ErrorContext },
    #[error("Shape error: {message}")]
    Shape { message: String, ctx: ErrorContext },
    #[error("Arity error: {message}")]
    Arity { message: String, ctx: ErrorContext },
    #[error("Assertion error: {message}")]
    Assertion { message: String, ctx: ErrorContext },
    #[error("Internal error: {message}")]
    Internal { message: String, ctx: ErrorContext },
    #[error("Error occurred at {location}")]
    Propagated {
        location: Location,
        #[source]
        source: Box<ProtoError>,
    },
}

impl ProtoError {
    fn parts(&self) -> Option<(&str, &ErrorContext)> {
        match self {
            ProtoError::Unbound { message, ctx }
            | ProtoError::Rebinding { message, ctx }
            | ProtoError::OverwriteNotPermitted { message, ctx }
            | ProtoError::UnknownPrefix { message, ctx }
            | ProtoError::KindMismatch { message, ctx }
            | ProtoError::Shape { message, ctx }
            | ProtoError::Arity { message, ctx }
            | ProtoError::Assertion { message, ctx }
            | ProtoError::Internal { message, ctx } => Some((message, ctx)),
            ProtoError::Propagated { .. } => None,
        }
    }

    /// Builds a shape error from an array engine failure.
    pub fn from_array(err: ArrayError, location: &Location) -> Self {
        ProtoError::Shape {
            message: err.to_string(),
            ctx: ErrorContext::at(location),
        }
    }

    /// Wraps this error in a frame recording the caller's location.
    pub fn propagate(self, location: &Location) -> Self {
        ProtoError::Propagated {
            location: location.clone(),
            source: Box::new(self),
        }
    }

    /// Attaches a help message to the innermost error.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let mut cursor = &mut self;
        loop {
            match cursor {
                ProtoError::Propagated { source, .. } => cursor = source,
                ProtoError::Unbound { ctx, .. }
                | ProtoError::Rebinding { ctx, .. }
                | ProtoError::OverwriteNotPermitted { ctx, .. }
                | ProtoError::UnknownPrefix { ctx, .. }
                | ProtoError::KindMismatch { ctx, .. }
                | ProtoError::Shape { ctx, .. }
                | ProtoError::Arity { ctx, .. }
                | ProtoError::Assertion { ctx, .. }
                | ProtoError::Internal { ctx, .. } => {
                    ctx.help = Some(help.into());
                    break;
                }
            }
        }
        self
    }

    /// The innermost error of a propagation chain.
    pub fn root_cause(&self) -> &ProtoError {
        let mut cursor = self;
        while let ProtoError::Propagated { source, .. } = cursor {
            cursor = source;
        }
        cursor
    }

    /// Classification of the root cause.
    pub fn error_type(&self) -> ErrorType {
        match self.root_cause() {
            ProtoError::Unbound { .. } => ErrorType::Unbound,
            ProtoError::Rebinding { .. } => ErrorType::Rebinding,
            ProtoError::OverwriteNotPermitted { .. } => ErrorType::OverwriteNotPermitted,
            ProtoError::UnknownPrefix { .. } => ErrorType::UnknownPrefix,
            ProtoError::KindMismatch { .. } => ErrorType::KindMismatch,
            ProtoError::Shape { .. } => ErrorType::Shape,
            ProtoError::Arity { .. } => ErrorType::Arity,
            ProtoError::Assertion { .. } => ErrorType::Assertion,
            ProtoError::Internal { .. } => ErrorType::Internal,
            // root_cause never yields a propagated frame
            ProtoError::Propagated { .. } => ErrorType::Internal,
        }
    }

    /// The root cause's message, without the classification prefix.
    pub fn message(&self) -> &str {
        self.root_cause().parts().map_or("", |(message, _)| message)
    }

    /// Location of the outermost frame.
    pub fn location(&self) -> &Location {
        match self {
            ProtoError::Propagated { location, .. } => location,
            ProtoError::Unbound { ctx, .. }
            | ProtoError::Rebinding { ctx, .. }
            | ProtoError::OverwriteNotPermitted { ctx, .. }
            | ProtoError::UnknownPrefix { ctx, .. }
            | ProtoError::KindMismatch { ctx, .. }
            | ProtoError::Shape { ctx, .. }
            | ProtoError::Arity { ctx, .. }
            | ProtoError::Assertion { ctx, .. }
            | ProtoError::Internal { ctx, .. } => &ctx.location,
        }
    }

    /// Flattens the chain into frames, innermost first.
    pub fn backtrace(&self) -> Vec<BacktraceFrame> {
        let mut outer_to_inner = Vec::new();
        let mut cursor = self;
        loop {
            match cursor {
                ProtoError::Propagated { location, source } => {
                    outer_to_inner.push(BacktraceFrame {
                        message: format!("Called from {location}"),
                        location: location.clone(),
                    });
                    cursor = source;
                }
                root => {
                    if let Some((message, ctx)) = root.parts() {
                        outer_to_inner.push(BacktraceFrame {
                            message: message.to_string(),
                            location: ctx.location.clone(),
                        });
                    }
                    break;
                }
            }
        }
        outer_to_inner.reverse();
        outer_to_inner
    }

    /// Formats the backtrace for users, innermost frame first.
    pub fn render_backtrace(&self, include_header: bool) -> String {
        let mut out = String::new();
        if include_header {
            let _ = writeln!(out, "{} error; backtrace (innermost first):", self.error_type());
        }
        for (i, frame) in self.backtrace().iter().enumerate() {
            let _ = writeln!(out, "  #{i} {}: {}", frame.location, frame.message);
        }
        out
    }
}

impl Diagnostic for ProtoError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            ProtoError::Propagated { .. } => None,
            other => Some(Box::new(format!(
                "protocore::{}",
                other.error_type().as_str().to_lowercase()
            ))),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        // a propagated frame reports the help of its root cause
        self.root_cause()
            .parts()
            .and_then(|(_, ctx)| ctx.help.as_ref())
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        match self {
            ProtoError::Propagated { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Adds a caller frame to the error side of a result.
pub trait Propagate<T> {
    fn at(self, location: &Location) -> Result<T, ProtoError>;
}

impl<T> Propagate<T> for Result<T, ProtoError> {
    fn at(self, location: &Location) -> Result<T, ProtoError> {
        self.map_err(|e| e.propagate(location))
    }
}

/// Constructs a `ProtoError` variant at a location with a formatted message.
#[macro_export]
macro_rules! proto_err {
    ($variant:ident, $loc:expr, $($arg:tt)+) => {
        $crate::ProtoError::$variant {
            message: format!($($arg)+),
            ctx: $crate::diagnostics::ErrorContext::at($loc),
        }
    };
}

/// Returns early with a `ProtoError` when a condition does not hold.
#[macro_export]
macro_rules! proto_ensure {
    ($cond:expr, $variant:ident, $loc:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::proto_err!($variant, $loc, $($arg)+));
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    fn loc(s: &str) -> Location {
        Location::new(s)
    }

    #[test]
    fn test_backtrace_innermost_first() {
        let inner = proto_err!(Unbound, &loc("line 3"), "Name x is not defined in this environment.");
        let err = inner.propagate(&loc("line 7")).propagate(&loc("line 9"));
        let frames = err.backtrace();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].location, loc("line 3"));
        assert_eq!(frames[0].message, "Name x is not defined in this environment.");
        assert_eq!(frames[1].location, loc("line 7"));
        assert_eq!(frames[2].location, loc("line 9"));
        assert_eq!(err.error_type(), ErrorType::Unbound);
        assert_eq!(err.location(), &loc("line 9"));
    }

    #[test]
    fn test_render_backtrace() {
        let err = proto_err!(Assertion, &loc("a.txt:1"), "Assertion failed: result is zero.")
            .propagate(&loc("a.txt:4"));
        let text = err.render_backtrace(true);
        assert!(text.starts_with("Assertion error; backtrace"));
        assert!(text.contains("#0 a.txt:1: Assertion failed: result is zero."));
        assert!(text.contains("#1 a.txt:4"));
        assert!(!err.render_backtrace(false).contains("backtrace"));
    }

    #[test]
    fn test_report_includes_chain_and_help() {
        let err = proto_err!(Shape, &loc("view"), "Range end 7 for dimension 0 is after the end (5) of the dimension.")
            .with_help("Use a negative index to count from the end.")
            .propagate(&loc("caller"));
        assert_eq!(err.message(), "Range end 7 for dimension 0 is after the end (5) of the dimension.");
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("Error occurred at caller"));
        assert!(output.contains("Range end 7"));
        assert!(output.contains("negative index"));
    }

    #[test]
    fn test_ensure_returns_early() {
        fn check(n: usize) -> Result<usize, ProtoError> {
            proto_ensure!(n > 0, Arity, &Location::default(), "Need at least {} operand.", 1);
            Ok(n)
        }
        assert!(check(2).is_ok());
        let err = check(0).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Arity);
        assert_eq!(err.message(), "Need at least 1 operand.");
    }
}
