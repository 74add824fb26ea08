//! Objects with replaceable method slots
//!
//! Rust values cannot have their methods swapped at runtime, so anything
//! that should be interceptable publishes its operations in a
//! [`MethodTable`]: a named set of slots holding reference-counted closures.
//! Callers invoke methods by name through the table, which lets an
//! interceptor replace a slot with a wrapper and later put the original back.
//!
//! Arguments and return values are [`serde_json::Value`]s. The receiver is
//! whatever state the closure captures.

use crate::error::VlugError;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A callable method slot value
pub type Method = Rc<dyn Fn(&[Value]) -> anyhow::Result<Value>>;

/// Whether two slot values are the same closure allocation
pub fn same_method(a: &Method, b: &Method) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Named collection of method slots
pub struct MethodTable {
    name: String,
    slots: RefCell<HashMap<String, Method>>,
}

impl MethodTable {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            slots: RefCell::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install `f` in the slot `fn_name`, replacing whatever was there
    pub fn define<F>(&self, fn_name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + 'static,
    {
        self.slots.borrow_mut().insert(fn_name.into(), Rc::new(f));
    }

    /// Current value of a slot
    pub fn method(&self, fn_name: &str) -> Option<Method> {
        self.slots.borrow().get(fn_name).cloned()
    }

    /// Overwrite a slot, or clear it with `None`; returns the previous value
    pub fn replace(&self, fn_name: &str, method: Option<Method>) -> Option<Method> {
        let mut slots = self.slots.borrow_mut();
        match method {
            Some(method) => slots.insert(fn_name.to_string(), method),
            None => slots.remove(fn_name),
        }
    }

    pub fn has_method(&self, fn_name: &str) -> bool {
        self.slots.borrow().contains_key(fn_name)
    }

    /// Slot names in sorted order
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Invoke the method currently installed in `fn_name`
    ///
    /// The slot is cloned out before the call, so a method may read or
    /// replace slots of its own table while it runs.
    pub fn call(&self, fn_name: &str, args: &[Value]) -> anyhow::Result<Value> {
        let method = self
            .method(fn_name)
            .ok_or_else(|| VlugError::MethodNotFound {
                object: self.name.clone(),
                method: fn_name.to_string(),
            })?;
        method(args)
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .finish()
    }
}
