//! Electronic signature tracking for host application records.
//!
//! A host record type opts in by implementing [`Trackable`] and calling
//! [`SignatureTracker::enable_tracking`]. From then on its rows can be
//! signed by a user (plain acknowledgment) or countersigned by a licensed
//! physician (clinical signature, which requires an effective date), and
//! queried for signed status. Every signature freezes a snapshot of the
//! signer's name and role at signing time so that later identity edits do
//! not rewrite history.

pub mod clock;
pub mod config;
pub mod display;
pub mod errors;
pub mod identity;
pub mod model;
pub mod registry;
pub mod storage;
pub mod tracking;

// Convenience re-exports
pub use clock::{FixedToday, SystemToday, TodayProvider};
pub use config::{load_config, TrackingConfig};
pub use display::describe;
pub use errors::{ConfigError, TrackError, TrackResult};
pub use identity::{
    Directory, MemoryDirectory, Physician, Role, RoleTaxonomy, StaticTaxonomy, User,
    PHYSICIAN_DISCIPLINE,
};
pub use model::{OwnerRef, Signature, SignatureDraft, SignedRole, StaticFields};
pub use registry::{TypeHandle, TypeRegistry};
pub use storage::Store;
pub use tracking::{SignatureTracker, Trackable};
