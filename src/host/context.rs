//! # Execution context: the global object an app's scripts run against.
//!
//! An [`ExecutionContext`] is a shared, mutable property bag. With isolation enabled it
//! is the sandbox's proxy context; without it, the host's own global context. Scripts
//! leave their lifecycle exports here (either as module exports or by assigning a
//! global), and built-in add-ons inject flags such as the public asset path.
//!
//! Every assignment records the property name, so sandboxes can report the most
//! recently assigned global without trapping anything themselves.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::apps::ModuleExports;

/// A value stored on an execution context.
#[derive(Clone)]
pub enum GlobalValue {
    /// Plain data (flags, paths, configuration).
    Data(Value),
    /// A duck-typed lifecycle export object.
    Exports(ModuleExports),
}

impl fmt::Debug for GlobalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalValue::Data(v) => write!(f, "Data({v})"),
            GlobalValue::Exports(e) => write!(f, "Exports({e:?})"),
        }
    }
}

/// Shared global property bag. Clones share the same storage.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    props: Arc<RwLock<HashMap<String, GlobalValue>>>,
    latest_set: Arc<RwLock<Option<String>>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<GlobalValue> {
        self.props.read().get(name).cloned()
    }

    /// Data value of a property, if it holds data.
    pub fn data(&self, name: &str) -> Option<Value> {
        match self.get(name)? {
            GlobalValue::Data(v) => Some(v),
            GlobalValue::Exports(_) => None,
        }
    }

    /// Export object of a property, if it holds one.
    pub fn exports(&self, name: &str) -> Option<ModuleExports> {
        match self.get(name)? {
            GlobalValue::Exports(e) => Some(e),
            GlobalValue::Data(_) => None,
        }
    }

    pub fn set(&self, name: impl Into<String>, value: GlobalValue) -> Option<GlobalValue> {
        let name = name.into();
        *self.latest_set.write() = Some(name.clone());
        self.props.write().insert(name, value)
    }

    /// Name of the most recently assigned property.
    pub fn latest_set_prop(&self) -> Option<String> {
        self.latest_set.read().clone()
    }

    pub fn set_data(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.set(name, GlobalValue::Data(value.into()));
    }

    pub fn set_exports(&self, name: impl Into<String>, exports: ModuleExports) {
        self.set(name, GlobalValue::Exports(exports));
    }

    pub fn remove(&self, name: &str) -> Option<GlobalValue> {
        self.props.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.read().contains_key(name)
    }

    /// True when both handles share storage.
    pub fn same_as(&self, other: &ExecutionContext) -> bool {
        Arc::ptr_eq(&self.props, &other.props)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let props = self.props.read();
        let mut keys: Vec<&String> = props.keys().collect();
        keys.sort_unstable();
        f.debug_struct("ExecutionContext").field("props", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage_and_track_latest_assignment() {
        let global = ExecutionContext::new();
        let alias = global.clone();
        assert!(global.same_as(&alias));
        assert!(!global.same_as(&ExecutionContext::new()));

        global.set_data("__flag__", true);
        alias.set_exports("purehtml", ModuleExports::new());
        assert_eq!(global.latest_set_prop().as_deref(), Some("purehtml"));
        assert!(global.exports("purehtml").is_some());
        assert!(global.data("purehtml").is_none());
        assert_eq!(alias.data("__flag__"), Some(Value::Bool(true)));

        global.remove("__flag__");
        assert!(!alias.contains("__flag__"));
    }
}
