//! Identity contract consumed from the host application.
//!
//! The host owns users, physicians, and the role taxonomy; this module
//! defines the views of them that signature tracking reads. Lookups that
//! must see *current* state (the display label, discipline matching) go
//! through a [`Directory`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node in the host's role hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub parent: Option<Box<Role>>,
}

impl Role {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    pub fn with_parent(name: impl Into<String>, parent: Role) -> Self {
        Self {
            name: name.into(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Walks the hierarchy to its root role.
    pub fn root(&self) -> &Role {
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            current = parent;
        }
        current
    }
}

/// The acting account that performs a signing action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Display name, e.g. "Alice Moore".
    pub name: String,
    /// Login name, e.g. "amoore".
    pub user_name: String,
    /// A user with no role snapshots a null role.
    #[serde(default)]
    pub role: Option<Role>,
    /// Physician identity linked to this account, if any.
    #[serde(default)]
    pub physician_id: Option<i64>,
}

/// A licensed physician identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Physician {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub nurse_practitioner: bool,
    #[serde(default)]
    pub medical_director: bool,
}

/// Live lookup into the host's identity records.
pub trait Directory {
    fn user(&self, id: i64) -> Option<User>;
    fn physician(&self, id: i64) -> Option<Physician>;
}

/// In-memory directory for tests and embedded hosts.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    users: HashMap<i64, User>,
    physicians: HashMap<i64, Physician>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_physician(&mut self, physician: Physician) {
        self.physicians.insert(physician.id, physician);
    }
}

impl Directory for MemoryDirectory {
    fn user(&self, id: i64) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn physician(&self, id: i64) -> Option<Physician> {
        self.physicians.get(&id).cloned()
    }
}

/// Discipline key that matches any physician-backed signature.
pub const PHYSICIAN_DISCIPLINE: &str = "physician";

/// Maps discipline keys (e.g. "nursing") to root role names.
pub trait RoleTaxonomy {
    fn role_name(&self, discipline: &str) -> Option<String>;
}

/// Fixed map taxonomy.
#[derive(Debug, Default, Clone)]
pub struct StaticTaxonomy {
    map: HashMap<String, String>,
}

impl StaticTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, discipline: impl Into<String>, role_name: impl Into<String>) -> Self {
        self.map.insert(discipline.into(), role_name.into());
        self
    }
}

impl RoleTaxonomy for StaticTaxonomy {
    fn role_name(&self, discipline: &str) -> Option<String> {
        self.map.get(discipline).cloned()
    }
}
