//! The name→value mapping used for variable scoping, with parent chaining for
//! lexical lookup. Environments are shared via `Rc<RefCell<..>>` because user
//! functions capture the environment active at their definition by reference, not
//! by value.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A single lexical scope: a local mapping plus an optional link to the enclosing
/// scope. `set` always writes to the local map; `get` walks outward through parents.
#[derive(Debug, Default)]
pub struct EnvironmentData {
	local: HashMap<String, Value>,
	parent: Option<Environment>,
}

/// A shared handle to an [`EnvironmentData`]. Cloning an `Environment` clones the
/// handle, not the underlying scope — two clones observe each other's writes, which
/// is exactly what a closure capturing its defining scope needs.
#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<EnvironmentData>>);

impl Environment {
	/// Creates a new root environment with no parent.
	#[must_use]
	pub fn root() -> Self {
		Self(Rc::new(RefCell::new(EnvironmentData::default())))
	}

	/// Creates a new environment whose lookups fall back to `parent` when a name
	/// isn't found locally.
	#[must_use]
	pub fn child_of(parent: &Self) -> Self {
		Self(Rc::new(RefCell::new(EnvironmentData { local: HashMap::new(), parent: Some(parent.clone()) })))
	}

	/// Looks up `name`, walking outward through parent scopes if it isn't found
	/// locally. Returns `None` if no scope in the chain binds it.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<Value> {
		let data = self.0.borrow();
		if let Some(value) = data.local.get(name) {
			return Some(value.clone());
		}
		data.parent.as_ref().and_then(|parent| parent.get(name))
	}

	/// Binds `name` to `value` in this environment's local frame. This always shadows
	/// an outer binding of the same name rather than writing through to it — there is
	/// no distinct `let` that writes locally versus a `set` that writes outward.
	pub fn set(&self, name: impl Into<String>, value: Value) {
		self.0.borrow_mut().local.insert(name.into(), value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::Value;

	#[test]
	fn child_sees_parent_bindings() {
		let parent = Environment::root();
		parent.set("x", Value::number(1.0));
		let child = Environment::child_of(&parent);
		assert_eq!(child.get("x"), Some(Value::number(1.0)));
	}

	#[test]
	fn child_writes_do_not_leak_to_parent() {
		let parent = Environment::root();
		let child = Environment::child_of(&parent);
		child.set("y", Value::number(2.0));
		assert_eq!(parent.get("y"), None);
	}

	#[test]
	fn shadowing_in_child_does_not_mutate_parent() {
		let parent = Environment::root();
		parent.set("x", Value::number(1.0));
		let child = Environment::child_of(&parent);
		child.set("x", Value::number(9.0));
		assert_eq!(child.get("x"), Some(Value::number(9.0)));
		assert_eq!(parent.get("x"), Some(Value::number(1.0)));
	}
}
