//! # Environments
//!
//! Name-to-value scopes with delegation. An environment consults its own
//! bindings first, then a delegatee: either one selected by a `prefix:` on the
//! name, or the unnamed default delegatee. Delegation forms a graph of shared
//! scopes; a child scope owns a strong handle to its parent, while closures
//! only hold a `WeakEnvironment` to the scope that defined them.
//!
//! Anything that can answer lookups (an environment, a model wrapper) plugs in
//! as a delegatee through the `Scope` trait.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use im::OrdMap;

use crate::ast::{Location, StatementNode};
use crate::diagnostics::ProtoError;
use crate::proto_err;
use crate::runtime::eval::{self, EvaluationContext};
use crate::value::Value;

/// Separates a delegatee prefix from the rest of a name (`oxmeta:membrane_voltage`).
pub const DELEGATION_SEPARATOR: char = ':';

static NEXT_FRESH_IDENT: AtomicUsize = AtomicUsize::new(0);

/// The lookup contract shared by environments and anything that can stand in
/// for one as a delegatee.
pub trait Scope {
    /// Resolves `name`, consulting delegatees when it is not bound locally.
    fn lookup(&self, name: &str, location: &Location) -> Result<Value, ProtoError>;

    /// Binds a new name in this scope.
    fn define(&self, name: &str, value: Value, location: &Location) -> Result<(), ProtoError>;

    /// Replaces an existing binding, here or in the delegatee that holds it.
    fn overwrite(&self, name: &str, value: Value, location: &Location) -> Result<(), ProtoError>;

    /// Whether `name` is bound locally; delegatees are not consulted.
    fn has_name(&self, name: &str) -> bool;

    /// Locally bound names, sorted.
    fn defined_names(&self) -> Vec<String>;

    /// Units of measure for a name, where the scope knows them.
    fn units_of(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Storage behind an `Environment` handle.
pub struct EnvironmentCore {
    bindings: RefCell<OrdMap<String, Value>>,
    // The "" key holds the default delegatee.
    delegatees: RefCell<OrdMap<String, Rc<dyn Scope>>>,
    sub_environments: RefCell<OrdMap<String, Environment>>,
    allow_overwrite: bool,
}

/// A shared handle to a scope. Cloning the handle shares the scope.
#[derive(Clone)]
pub struct Environment(Rc<EnvironmentCore>);

/// A non-owning handle to an environment; it does not keep the scope alive.
#[derive(Clone)]
pub struct WeakEnvironment(Weak<EnvironmentCore>);

impl WeakEnvironment {
    /// Recovers the environment if something else still owns it.
    pub fn upgrade(&self) -> Option<Environment> {
        self.0.upgrade().map(Environment)
    }
}

impl fmt::Debug for WeakEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.strong_count() > 0 { "live" } else { "dropped" };
        write!(f, "WeakEnvironment({state})")
    }
}

impl Environment {
    /// Creates an empty root environment.
    ///
    /// ```rust
    /// use protocore::ast::Location;
    /// use protocore::runtime::environment::Environment;
    /// use protocore::value::Value;
    /// let env = Environment::new(false);
    /// let loc = Location::default();
    /// env.define("x", Value::Number(1.0), &loc).unwrap();
    /// assert_eq!(env.lookup("x", &loc).unwrap(), Value::Number(1.0));
    /// assert!(env.define("x", Value::Number(2.0), &loc).is_err());
    /// ```
    pub fn new(allow_overwrite: bool) -> Self {
        Environment(Rc::new(EnvironmentCore {
            bindings: RefCell::new(OrdMap::new()),
            delegatees: RefCell::new(OrdMap::new()),
            sub_environments: RefCell::new(OrdMap::new()),
            allow_overwrite,
        }))
    }

    /// Creates a scope whose default delegatee is `parent`; names defined in the
    /// child shadow the parent's without altering it.
    pub fn child_of(parent: &Environment) -> Self {
        let child = Environment::new(false);
        child
            .0
            .delegatees
            .borrow_mut()
            .insert(String::new(), parent.as_delegatee());
        child
    }

    pub fn allows_overwrite(&self) -> bool {
        self.0.allow_overwrite
    }

    /// This environment as a delegatee of another.
    pub fn as_delegatee(&self) -> Rc<dyn Scope> {
        self.0.clone()
    }

    pub fn downgrade(&self) -> WeakEnvironment {
        WeakEnvironment(Rc::downgrade(&self.0))
    }

    /// True if both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Binds `delegatee` under `prefix`; the empty prefix sets the default
    /// delegatee, which may be replaced freely. A non-empty prefix cannot be
    /// rebound to a different scope.
    pub fn set_delegatee(
        &self,
        prefix: &str,
        delegatee: Rc<dyn Scope>,
        location: &Location,
    ) -> Result<(), ProtoError> {
        let mut delegatees = self.0.delegatees.borrow_mut();
        if !prefix.is_empty() {
            if let Some(existing) = delegatees.get(prefix) {
                let same = Rc::as_ptr(existing) as *const () == Rc::as_ptr(&delegatee) as *const ();
                if !same {
                    return Err(proto_err!(
                        Rebinding,
                        location,
                        "The prefix '{prefix}' has already been used for a different environment."
                    ));
                }
            }
        }
        delegatees.insert(prefix.to_string(), delegatee);
        Ok(())
    }

    /// The delegatee bound under `prefix` ("" for the default).
    pub fn delegatee(&self, prefix: &str) -> Option<Rc<dyn Scope>> {
        self.0.delegatees.borrow().get(prefix).cloned()
    }

    /// Binds `env` as a prefixed delegatee and records it so `clear` also
    /// empties it.
    pub fn add_sub_environment(
        &self,
        prefix: &str,
        env: Environment,
        location: &Location,
    ) -> Result<(), ProtoError> {
        if prefix.is_empty() {
            return Err(proto_err!(
                KindMismatch,
                location,
                "Sub-environments must be bound under a non-empty prefix."
            ));
        }
        self.set_delegatee(prefix, env.as_delegatee(), location)?;
        self.0.sub_environments.borrow_mut().insert(prefix.to_string(), env);
        Ok(())
    }

    pub fn lookup(&self, name: &str, location: &Location) -> Result<Value, ProtoError> {
        self.0.lookup(name, location)
    }

    pub fn define(&self, name: &str, value: Value, location: &Location) -> Result<(), ProtoError> {
        self.0.define(name, value, location)
    }

    pub fn overwrite(&self, name: &str, value: Value, location: &Location) -> Result<(), ProtoError> {
        self.0.overwrite(name, value, location)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.0.has_name(name)
    }

    pub fn defined_names(&self) -> Vec<String> {
        self.0.defined_names()
    }

    /// Units for a name: a delegatee that knows them answers for prefixed names.
    pub fn units_of(&self, name: &str) -> Option<String> {
        self.0.units_of(name)
    }

    /// Defines each name with the value at the same position.
    pub fn define_names(
        &self,
        names: &[String],
        values: Vec<Value>,
        location: &Location,
    ) -> Result<(), ProtoError> {
        if names.len() != values.len() {
            return Err(proto_err!(
                Arity,
                location,
                "Cannot define {} names with {} values.",
                names.len(),
                values.len()
            ));
        }
        for (name, value) in names.iter().zip(values) {
            self.define(name, value, location)?;
        }
        Ok(())
    }

    /// Removes a local binding. Only overwrite-permitting scopes allow this.
    pub fn remove_definition(&self, name: &str, location: &Location) -> Result<(), ProtoError> {
        if !self.0.allow_overwrite {
            return Err(proto_err!(
                OverwriteNotPermitted,
                location,
                "This environment does not support overwriting mappings."
            ));
        }
        match self.0.bindings.borrow_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(proto_err!(
                Unbound,
                location,
                "Name {name} is not defined in this environment."
            )),
        }
    }

    /// Defines every local binding of `other` here; conflicts fail as `define` does.
    pub fn merge(&self, other: &Environment, location: &Location) -> Result<(), ProtoError> {
        let snapshot = other.0.bindings.borrow().clone();
        for (name, value) in snapshot {
            self.define(&name, value, location)?;
        }
        Ok(())
    }

    /// Drops every local binding, and those of registered sub-environments.
    pub fn clear(&self) {
        self.0.bindings.borrow_mut().clear();
        let subs = self.0.sub_environments.borrow().clone();
        for env in subs.values() {
            env.clear();
        }
    }

    pub fn number_of_definitions(&self) -> usize {
        self.0.bindings.borrow().len()
    }

    /// A name no protocol can write, for generated parameters.
    pub fn fresh_ident() -> String {
        format!("~{}", NEXT_FRESH_IDENT.fetch_add(1, Ordering::Relaxed))
    }

    /// Executes one top-level statement; a return is an error here.
    pub fn execute_statement(&self, statement: &StatementNode) -> Result<Value, ProtoError> {
        let mut context = EvaluationContext::default();
        eval::execute_statement(statement, self, &mut context, false)
    }

    /// Executes statements in order until one yields a value.
    pub fn execute_statements(
        &self,
        statements: &[StatementNode],
        return_allowed: bool,
    ) -> Result<Value, ProtoError> {
        let mut context = EvaluationContext::default();
        eval::execute_statements(statements, self, &mut context, return_allowed)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.defined_names())
            .field("delegatees", &self.0.delegatees.borrow().keys().collect::<Vec<_>>())
            .field("allow_overwrite", &self.0.allow_overwrite)
            .finish()
    }
}

impl EnvironmentCore {
    /// Picks the delegatee for `name`, returning it with the name it should be
    /// looked up under there.
    fn find_delegatee(
        &self,
        name: &str,
        location: &Location,
    ) -> Result<Option<(Rc<dyn Scope>, String)>, ProtoError> {
        let delegatees = self.delegatees.borrow();
        if let Some((prefix, rest)) = name.split_once(DELEGATION_SEPARATOR) {
            if let Some(d) = delegatees.get(prefix) {
                return Ok(Some((d.clone(), rest.to_string())));
            }
            return match delegatees.get("") {
                Some(d) => Ok(Some((d.clone(), name.to_string()))),
                None => Err(proto_err!(
                    UnknownPrefix,
                    location,
                    "No environment associated with the prefix '{prefix}'."
                )),
            };
        }
        Ok(delegatees.get("").map(|d| (d.clone(), name.to_string())))
    }
}

impl Scope for EnvironmentCore {
    fn lookup(&self, name: &str, location: &Location) -> Result<Value, ProtoError> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }
        match self.find_delegatee(name, location)? {
            Some((delegatee, local_name)) => delegatee.lookup(&local_name, location),
            None => Err(proto_err!(
                Unbound,
                location,
                "Name {name} is not defined in this environment."
            )),
        }
    }

    fn define(&self, name: &str, value: Value, location: &Location) -> Result<(), ProtoError> {
        if name.contains(DELEGATION_SEPARATOR) {
            return Err(proto_err!(
                KindMismatch,
                location,
                "Names such as '{name}' containing a colon are not allowed."
            ));
        }
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(proto_err!(
                Rebinding,
                location,
                "Name {name} is already defined and may not be re-bound."
            ));
        }
        bindings.insert(name.to_string(), value);
        Ok(())
    }

    fn overwrite(&self, name: &str, value: Value, location: &Location) -> Result<(), ProtoError> {
        if self.bindings.borrow().contains_key(name) {
            if !self.allow_overwrite {
                return Err(proto_err!(
                    OverwriteNotPermitted,
                    location,
                    "This environment does not support overwriting mappings."
                ));
            }
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        match self.find_delegatee(name, location)? {
            Some((delegatee, local_name)) => delegatee.overwrite(&local_name, value, location),
            None if self.allow_overwrite => Err(proto_err!(
                OverwriteNotPermitted,
                location,
                "Name {name} is not defined and may not be overwritten."
            )),
            None => Err(proto_err!(
                OverwriteNotPermitted,
                location,
                "This environment does not support overwriting mappings."
            )),
        }
    }

    fn has_name(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    fn defined_names(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }

    fn units_of(&self, name: &str) -> Option<String> {
        if self.has_name(name) {
            return None;
        }
        let (prefix, rest) = name.split_once(DELEGATION_SEPARATOR)?;
        let delegatee = self.delegatees.borrow().get(prefix).cloned()?;
        delegatee.units_of(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    fn loc() -> Location {
        Location::new("test")
    }

    #[test]
    fn prefixed_lookup_strips_prefix() {
        let root = Environment::new(false);
        let lib = Environment::new(false);
        lib.define("diff", Value::Number(7.0), &loc()).unwrap();
        root.set_delegatee("std", lib.as_delegatee(), &loc()).unwrap();
        assert_eq!(root.lookup("std:diff", &loc()).unwrap(), Value::Number(7.0));
        let err = root.lookup("other:diff", &loc()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::UnknownPrefix);
        assert_eq!(err.message(), "No environment associated with the prefix 'other'.");
    }

    #[test]
    fn unknown_prefix_falls_back_to_default_delegatee() {
        let model = Environment::new(false);
        model.define("x", Value::Number(3.0), &loc()).unwrap();
        let parent = Environment::new(false);
        parent.set_delegatee("p", model.as_delegatee(), &loc()).unwrap();
        let child = Environment::child_of(&parent);
        assert_eq!(child.lookup("p:x", &loc()).unwrap(), Value::Number(3.0));

        let orphan = Environment::child_of(&Environment::new(false));
        let err = orphan.lookup("q:x", &loc()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::UnknownPrefix);
    }

    #[test]
    fn colon_names_cannot_be_defined() {
        let env = Environment::new(false);
        let err = env.define("a:b", Value::Null, &loc()).unwrap_err();
        assert_eq!(err.message(), "Names such as 'a:b' containing a colon are not allowed.");
    }

    #[test]
    fn prefix_cannot_be_rebound_to_another_scope() {
        let env = Environment::new(false);
        let a = Environment::new(false);
        let b = Environment::new(false);
        env.set_delegatee("m", a.as_delegatee(), &loc()).unwrap();
        env.set_delegatee("m", a.as_delegatee(), &loc()).unwrap();
        assert!(env.set_delegatee("m", b.as_delegatee(), &loc()).is_err());
        env.set_delegatee("", a.as_delegatee(), &loc()).unwrap();
        env.set_delegatee("", b.as_delegatee(), &loc()).unwrap();
    }

    #[test]
    fn fresh_idents_are_distinct() {
        let a = Environment::fresh_ident();
        let b = Environment::fresh_ident();
        assert_ne!(a, b);
        assert!(a.starts_with('~'));
    }

    #[test]
    fn weak_handle_does_not_keep_scope_alive() {
        let env = Environment::new(false);
        let weak = env.downgrade();
        assert!(weak.upgrade().is_some());
        drop(env);
        assert!(weak.upgrade().is_none());
    }
}
