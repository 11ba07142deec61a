//! # Closures
//!
//! User-defined functions. A closure keeps its defining scope only through a
//! `WeakEnvironment`: the scope must be owned elsewhere, so a scope and the
//! closures bound in it never keep each other alive. Calling a closure whose
//! defining scope has been dropped is an `Internal` error.

use std::fmt;

use tracing::{debug, warn};

use crate::ast::{Location, StatementNode};
use crate::diagnostics::{ProtoError, Propagate};
use crate::proto_err;
use crate::runtime::environment::{Environment, WeakEnvironment};
use crate::runtime::eval::{self, EvaluationContext};
use crate::value::Value;

pub struct Closure {
    params: Vec<String>,
    body: Vec<StatementNode>,
    // Empty, or one entry per parameter.
    defaults: Vec<Option<Value>>,
    defining_env: WeakEnvironment,
    location: Location,
}

impl Closure {
    /// Creates a closure over `defining_env`.
    ///
    /// Fails if defaults are given for some but not all parameter positions.
    pub fn new(
        params: Vec<String>,
        body: Vec<StatementNode>,
        defaults: Vec<Option<Value>>,
        defining_env: &Environment,
        location: Location,
    ) -> Result<Self, ProtoError> {
        if !defaults.is_empty() && defaults.len() != params.len() {
            return Err(proto_err!(
                Arity,
                &location,
                "If default values are given, the vector should have the same size as the number of parameters ({}); length was {}.",
                params.len(),
                defaults.len()
            ));
        }
        Ok(Closure {
            params,
            body,
            defaults,
            defining_env: defining_env.downgrade(),
            location,
        })
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Calls the closure with already-evaluated arguments.
    ///
    /// Missing trailing arguments, and arguments equal to `Value::Default`,
    /// take the parameter's default. The body runs in a fresh scope delegating
    /// to the defining scope; the result is the first value it returns, or
    /// `Null`.
    pub fn call(&self, args: Vec<Value>, context: &mut EvaluationContext) -> Result<Value, ProtoError> {
        let bound = self.bind_arguments(args)?;

        if context.depth >= context.options.max_call_depth {
            return Err(proto_err!(
                Internal,
                &self.location,
                "Recursion limit exceeded: more than {} nested function calls.",
                context.options.max_call_depth
            ));
        }
        let Some(defining_env) = self.defining_env.upgrade() else {
            warn!(location = %self.location, "closure called after its defining environment was dropped");
            return Err(proto_err!(
                Internal,
                &self.location,
                "The environment this function was defined in no longer exists."
            ));
        };
        debug!(location = %self.location, params = self.params.len(), depth = context.depth, "calling closure");

        let local = Environment::child_of(&defining_env);
        local.define_names(&self.params, bound, &self.location)?;

        context.depth += 1;
        let result = eval::execute_statements(&self.body, &local, context, true);
        context.depth -= 1;
        result.at(&self.location)
    }

    fn bind_arguments(&self, mut args: Vec<Value>) -> Result<Vec<Value>, ProtoError> {
        let num_params = self.params.len();
        let arity_ok =
            args.len() == num_params || (!self.defaults.is_empty() && args.len() < num_params);
        if !arity_ok {
            return Err(proto_err!(
                Arity,
                &self.location,
                "Function expected {} parameters, but received {}.",
                num_params,
                args.len()
            ));
        }
        args.resize(num_params, Value::Default);
        for (i, arg) in args.iter_mut().enumerate() {
            if arg.is_default() {
                let default = self.defaults.get(i).cloned().flatten().ok_or_else(|| {
                    proto_err!(
                        Arity,
                        &self.location,
                        "Default value requested for parameter {i}, but no default supplied."
                    )
                })?;
                *arg = default;
            }
        }
        Ok(args)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("statements", &self.body.len())
            .field("defaults", &self.defaults)
            .field("location", &self.location)
            .finish()
    }
}
