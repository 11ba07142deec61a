//! # Protocol Engine
//!
//! Entry points for whatever drives a protocol: build a root environment
//! (optionally delegating to a model and the standard library), run batches of
//! statements against it, and read named results back out as arrays with
//! units.
//!
//! ```rust
//! use protocore::ast::builder::*;
//! use protocore::atoms::Operator;
//! use protocore::engine::{Engine, EngineConfig, OutputSpec};
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! engine
//!     .run(&[assign("x", apply(Operator::Times, vec![num(6.0), num(7.0)]))])
//!     .unwrap();
//! let outputs = engine.read_outputs(&[OutputSpec::named("x")]).unwrap();
//! assert_eq!(outputs[0].array.to_vec(), vec![42.0]);
//! assert_eq!(outputs[0].units, "unspecified");
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::array::NdArray;
use crate::ast::{Location, StatementNode};
use crate::diagnostics::ProtoError;
use crate::proto_err;
use crate::runtime::eval::{self, EvalOptions, EvaluationContext};
use crate::runtime::model::{ModelWrapper, ParameterisedModel};
use crate::runtime::{library, Environment};

/// Units reported for outputs nobody gave units to.
pub const UNSPECIFIED_UNITS: &str = "unspecified";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Engine settings, loadable from YAML or JSON.
///
/// ```rust
/// use protocore::engine::EngineConfig;
/// let config = EngineConfig::from_yaml_str("options:\n  max_call_depth: 64\nlibrary: false\n").unwrap();
/// assert_eq!(config.options.max_call_depth, 64);
/// assert!(!config.library);
/// assert!(config.allow_overwrite_inputs);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub options: EvalOptions,
    /// Whether the root environment permits overwriting its bindings.
    pub allow_overwrite_inputs: bool,
    /// Whether the standard library is available to protocols.
    pub library: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            options: EvalOptions::default(),
            allow_overwrite_inputs: true,
            library: true,
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Invalid YAML engine configuration: {0}")]
    #[diagnostic(code(protocore::config::yaml))]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid JSON engine configuration: {0}")]
    #[diagnostic(code(protocore::config::json))]
    Json(#[from] serde_json::Error),
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// OUTPUTS
// ============================================================================

/// A result to read out after running a protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Name the output is published under.
    pub name: String,
    /// Name to look up, if different from `name` (e.g. `oxmeta:membrane_voltage`).
    #[serde(default)]
    pub reference: Option<String>,
    /// Units overriding any the environment knows.
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub location: Location,
}

impl OutputSpec {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reference: None,
            units: None,
            location: Location::default(),
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }
}

/// A published result: always an array (scalars are 0-d) with units.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolOutput {
    pub name: String,
    pub array: NdArray,
    pub units: String,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    config: EngineConfig,
    root: Environment,
    library: Option<Environment>,
}

impl Engine {
    /// Builds the root environment, delegating to the library when enabled.
    pub fn new(config: EngineConfig) -> Result<Self, ProtoError> {
        let root = Environment::new(config.allow_overwrite_inputs);
        let library = if config.library {
            let lib = Environment::new(false);
            library::define_all(&lib)?;
            root.set_delegatee("", lib.as_delegatee(), &Location::default())?;
            Some(lib)
        } else {
            None
        };
        Ok(Self { config, root, library })
    }

    /// Binds a model's variables under `prefix`.
    pub fn with_model<M: ParameterisedModel + 'static>(
        self,
        prefix: &str,
        model: Rc<RefCell<M>>,
    ) -> Result<Self, ProtoError> {
        let wrapper: Rc<dyn crate::runtime::Scope> = Rc::new(ModelWrapper::new(model));
        self.root.set_delegatee(prefix, wrapper, &Location::default())?;
        Ok(self)
    }

    pub fn root(&self) -> &Environment {
        &self.root
    }

    pub fn library(&self) -> Option<&Environment> {
        self.library.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Executes top-level statements in order; a return statement is an error.
    pub fn run(&self, statements: &[StatementNode]) -> Result<(), ProtoError> {
        debug!(statements = statements.len(), "running statement batch");
        let mut context = EvaluationContext::new(self.config.options);
        eval::execute_statements(statements, &self.root, &mut context, false)?;
        Ok(())
    }

    /// Reads named results out of the root environment.
    ///
    /// Numbers become 0-d arrays; any other non-array value fails. Units come
    /// from [`OutputSpec::units`], else from the scope that holds the value,
    /// else [`UNSPECIFIED_UNITS`].
    pub fn read_outputs(&self, specs: &[OutputSpec]) -> Result<Vec<ProtocolOutput>, ProtoError> {
        specs
            .iter()
            .map(|spec| {
                let reference = spec.reference.as_deref().unwrap_or(&spec.name);
                let value = self.root.lookup(reference, &spec.location)?;
                let array = value.as_array().ok_or_else(|| {
                    proto_err!(
                        KindMismatch,
                        &spec.location,
                        "Output {} must be an array, not a {}.",
                        spec.name,
                        value.type_name()
                    )
                })?;
                let units = spec
                    .units
                    .clone()
                    .or_else(|| self.root.units_of(reference))
                    .unwrap_or_else(|| UNSPECIFIED_UNITS.to_string());
                Ok(ProtocolOutput {
                    name: spec.name.clone(),
                    array,
                    units,
                })
            })
            .collect()
    }
}
