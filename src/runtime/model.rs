//! # Model Wrapper
//!
//! Exposes a simulation model's variables to protocols through the `Scope`
//! contract, so `oxmeta:membrane_voltage` reads (and, where the model allows,
//! writes) a model variable once the wrapper is bound under the `oxmeta`
//! prefix.

use std::cell::RefCell;
use std::rc::Rc;

use im::OrdMap;

use crate::ast::Location;
use crate::diagnostics::ProtoError;
use crate::proto_err;
use crate::runtime::environment::Scope;
use crate::value::Value;

/// A model whose named variables can be read and written.
pub trait ParameterisedModel {
    /// Every variable name, in the model's preferred order.
    fn variable_names(&self) -> Vec<String>;

    /// Current value of a variable, or `None` if the model has no such variable.
    fn variable(&self, name: &str) -> Option<f64>;

    /// Sets a variable, returning false if the model has no such variable.
    fn set_variable(&mut self, name: &str, value: f64) -> bool;

    /// Units of measure of a variable.
    fn units(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Adapts a `ParameterisedModel` to the `Scope` contract.
///
/// The model stays shared with the caller, which keeps driving it between
/// protocol steps.
pub struct ModelWrapper<M> {
    model: Rc<RefCell<M>>,
}

impl<M: ParameterisedModel> ModelWrapper<M> {
    pub fn new(model: Rc<RefCell<M>>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Rc<RefCell<M>> {
        &self.model
    }
}

impl<M: ParameterisedModel> Scope for ModelWrapper<M> {
    fn lookup(&self, name: &str, location: &Location) -> Result<Value, ProtoError> {
        self.model
            .borrow()
            .variable(name)
            .map(Value::Number)
            .ok_or_else(|| proto_err!(Unbound, location, "Name {name} is not defined in the model."))
    }

    fn define(&self, _name: &str, _value: Value, location: &Location) -> Result<(), ProtoError> {
        Err(proto_err!(
            Rebinding,
            location,
            "Defining new names in a model is not allowed."
        ))
    }

    fn overwrite(&self, name: &str, value: Value, location: &Location) -> Result<(), ProtoError> {
        let x = value.as_number().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                location,
                "Only real numbers can be assigned to model variables."
            )
        })?;
        if self.model.borrow_mut().set_variable(name, x) {
            Ok(())
        } else {
            Err(proto_err!(Unbound, location, "Name {name} is not defined in the model."))
        }
    }

    fn has_name(&self, name: &str) -> bool {
        self.model.borrow().variable(name).is_some()
    }

    fn defined_names(&self) -> Vec<String> {
        let mut names = self.model.borrow().variable_names();
        names.sort();
        names
    }

    fn units_of(&self, name: &str) -> Option<String> {
        self.model.borrow().units(name)
    }
}

/// An in-memory table of named variables with units; the simplest model.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    variables: OrdMap<String, (f64, String)>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    pub fn insert(&mut self, name: &str, value: f64, units: &str) {
        self.variables.insert(name.to_string(), (value, units.to_string()));
    }

    pub fn with(mut self, name: &str, value: f64, units: &str) -> Self {
        self.insert(name, value, units);
        self
    }
}

impl ParameterisedModel for VariableTable {
    fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).map(|(value, _)| *value)
    }

    fn set_variable(&mut self, name: &str, value: f64) -> bool {
        match self.variables.get_mut(name) {
            Some(entry) => {
                entry.0 = value;
                true
            }
            None => false,
        }
    }

    fn units(&self, name: &str) -> Option<String> {
        self.variables.get(name).map(|(_, units)| units.clone())
    }
}
