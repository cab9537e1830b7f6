//! Process-wide registry of record types with signature tracking enabled.
//!
//! Initialized empty, populated as types opt in. Append-only; there is no
//! unregister.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Resolved handle for a record type that opted into tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHandle {
    /// Type identifier stored in `signatures.owner_type`.
    pub name: String,
    /// SQL table holding the type's rows.
    pub table: String,
}

impl TypeHandle {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
        }
    }
}

/// Append-only set of tracked type names plus their resolved handles.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    names: Vec<String>,
    handles: HashMap<String, TypeHandle>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent append of a type name.
    pub fn register(&mut self, name: &str) {
        if !self.is_registered(name) {
            self.names.push(name.to_string());
        }
    }

    /// Registers a name together with its resolved handle.
    pub fn register_handle(&mut self, handle: TypeHandle) {
        self.register(&handle.name);
        self.handles.insert(handle.name.clone(), handle);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Registered handles in registration order. Names with no resolvable
    /// handle are compacted out, not surfaced as errors.
    pub fn registered_types(&self) -> Vec<TypeHandle> {
        self.names
            .iter()
            .filter_map(|name| self.handles.get(name).cloned())
            .collect()
    }

    /// Clears all registrations. Test support; production registration is
    /// append-only.
    pub fn reset(&mut self) {
        self.names.clear();
        self.handles.clear();
    }
}

static GLOBAL: OnceLock<Mutex<TypeRegistry>> = OnceLock::new();

/// The process-wide registry.
pub fn global() -> MutexGuard<'static, TypeRegistry> {
    GLOBAL
        .get_or_init(|| Mutex::new(TypeRegistry::new()))
        .lock()
        .unwrap()
}
