//! Signature row types and the point-in-time signer snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::{Physician, User};

/// Tagged reference to the record a signature attests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub type_name: String,
    pub id: i64,
}

impl OwnerRef {
    pub fn new(type_name: impl Into<String>, id: i64) -> Self {
        Self {
            type_name: type_name.into(),
            id,
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.id)
    }
}

/// Role label attached to a signing event. For physician-backed
/// signatures, nurse-practitioner status wins over medical-director
/// status; first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedRole {
    NursePractitioner,
    MedicalDirector,
    Physician,
    User,
}

impl SignedRole {
    pub fn of_physician(physician: &Physician) -> Self {
        if physician.nurse_practitioner {
            Self::NursePractitioner
        } else if physician.medical_director {
            Self::MedicalDirector
        } else {
            Self::Physician
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NursePractitioner => "Nurse Practitioner",
            Self::MedicalDirector => "Medical Director",
            Self::Physician => "Physician",
            Self::User => "User",
        }
    }
}

impl fmt::Display for SignedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One persisted signing event. Immutable after creation; the `static_*`
/// fields are the frozen snapshot of the signer at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub id: i64,
    pub owner: OwnerRef,
    pub user_id: i64,
    pub physician_id: Option<i64>,
    /// Required for physician signatures, always null for plain ones.
    pub effective_date: Option<NaiveDate>,
    pub static_role: Option<String>,
    pub static_name: String,
    pub static_user_name: String,
    pub created_at: DateTime<Utc>,
}

impl Signature {
    /// The date the signature counts from: the effective date when set,
    /// otherwise the creation date.
    pub fn signed_date(&self) -> NaiveDate {
        self.effective_date
            .unwrap_or_else(|| self.created_at.date_naive())
    }
}

/// Point-in-time snapshot of the signer, captured once before insert and
/// never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFields {
    pub role: Option<String>,
    pub name: String,
    pub user_name: String,
}

impl StaticFields {
    /// Reads the current state of `user`/`physician`. Physician path
    /// labels by credential precedence and names the physician; the plain
    /// path walks the user's role hierarchy to its root (null-safe) and
    /// names the user.
    pub fn capture(user: &User, physician: Option<&Physician>) -> Self {
        match physician {
            Some(physician) => Self {
                role: Some(SignedRole::of_physician(physician).label().to_string()),
                name: physician.name.clone(),
                user_name: user.user_name.clone(),
            },
            None => Self {
                role: user.role.as_ref().map(|r| r.root().name.clone()),
                name: user.name.clone(),
                user_name: user.user_name.clone(),
            },
        }
    }
}

/// Unvalidated creation input. Owner and user stay optional here so
/// presence validation happens at creation time rather than in the type
/// system; both are required for the draft to persist.
#[derive(Debug, Clone, Default)]
pub struct SignatureDraft<'a> {
    pub owner: Option<OwnerRef>,
    pub user: Option<&'a User>,
    pub physician: Option<&'a Physician>,
    pub effective_date: Option<NaiveDate>,
}

impl<'a> SignatureDraft<'a> {
    pub fn new(owner: OwnerRef, user: &'a User) -> Self {
        Self {
            owner: Some(owner),
            user: Some(user),
            physician: None,
            effective_date: None,
        }
    }

    pub fn with_physician(mut self, physician: &'a Physician) -> Self {
        self.physician = Some(physician);
        self
    }

    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }
}
