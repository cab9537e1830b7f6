//! The trackable capability: the operation set a record type gains once
//! it opts into signature tracking.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::clock::{SystemToday, TodayProvider};
use crate::errors::{TrackError, TrackResult};
use crate::identity::{Directory, Physician, RoleTaxonomy, User, PHYSICIAN_DISCIPLINE};
use crate::model::{OwnerRef, Signature, SignatureDraft, StaticFields};
use crate::registry::{self, TypeHandle};
use crate::storage::Store;

/// A host record type that has opted into signature tracking.
pub trait Trackable {
    /// Type identifier stored in `signatures.owner_type`.
    const TYPE_NAME: &'static str;
    /// SQL table holding this record type's rows.
    const TABLE: &'static str;

    fn record_id(&self) -> i64;

    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new(Self::TYPE_NAME, self.record_id())
    }

    fn handle() -> TypeHandle {
        TypeHandle::new(Self::TYPE_NAME, Self::TABLE)
    }
}

/// Capability service over the signature store. Holds the host-supplied
/// directory (live identity reads), role taxonomy, and "today" provider.
pub struct SignatureTracker<D, T> {
    store: Store,
    directory: D,
    taxonomy: T,
    today: Box<dyn TodayProvider>,
}

impl<D: Directory, T: RoleTaxonomy> SignatureTracker<D, T> {
    pub fn new(store: Store, directory: D, taxonomy: T) -> Self {
        Self {
            store,
            directory,
            taxonomy,
            today: Box::new(SystemToday::new()),
        }
    }

    pub fn with_today(mut self, today: Box<dyn TodayProvider>) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Opt-in for a record type: registers it in the process-wide
    /// registry and installs the owner-delete cascade.
    pub fn enable_tracking<R: Trackable>(&self) -> TrackResult<()> {
        let handle = R::handle();
        self.store.enable_cascade(&handle)?;
        info!(type_name = handle.name.as_str(), "signature tracking enabled");
        registry::global().register_handle(handle);
        Ok(())
    }

    /// Signs `owner`. When no physician is passed, falls back to the
    /// physician linked to the signing user's account, if any.
    pub fn track<R: Trackable>(
        &self,
        owner: &R,
        user: &User,
        physician: Option<&Physician>,
        effective_date: Option<NaiveDate>,
    ) -> TrackResult<Signature> {
        let fallback = if physician.is_none() {
            user.physician_id.and_then(|id| self.directory.physician(id))
        } else {
            None
        };
        self.create(SignatureDraft {
            owner: Some(owner.owner_ref()),
            user: Some(user),
            physician: physician.or(fallback.as_ref()),
            effective_date,
        })
    }

    /// Creates one signature from a draft: resolves the effective date,
    /// validates presence, freezes the signer snapshot, and inserts.
    /// All-or-nothing; validation failures persist no row.
    pub fn create(&self, mut draft: SignatureDraft<'_>) -> TrackResult<Signature> {
        // A plain signature carries no effective date, whatever the caller
        // passed. A physician signature defaults to today.
        if draft.physician.is_none() {
            draft.effective_date = None;
        } else if draft.effective_date.is_none() {
            draft.effective_date = Some(self.today.today());
        }

        let owner = draft.owner.clone().ok_or(TrackError::MissingOwner)?;
        let user = draft.user.ok_or(TrackError::MissingUser)?;
        if draft.physician.is_some() && draft.effective_date.is_none() {
            return Err(TrackError::MissingEffectiveDate);
        }

        let fields = StaticFields::capture(user, draft.physician);
        debug!(
            owner = %owner,
            user_id = user.id,
            physician = draft.physician.is_some(),
            "recording signature"
        );
        self.store.insert_signature(
            &owner,
            user.id,
            draft.physician.map(|p| p.id),
            draft.effective_date,
            &fields,
            Utc::now(),
        )
    }

    /// True iff at least one signature exists for the record.
    pub fn has_signature<R: Trackable>(&self, owner: &R) -> TrackResult<bool> {
        self.store.has_signature(&owner.owner_ref())
    }

    /// True iff at least one physician-bearing signature exists.
    pub fn has_physician_signature<R: Trackable>(&self, owner: &R) -> TrackResult<bool> {
        self.store.has_physician_signature(&owner.owner_ref())
    }

    /// True iff `user` left a plain signature on the record. A
    /// physician-countersigned entry by the same user does not count.
    pub fn has_signature_by<R: Trackable>(&self, owner: &R, user: &User) -> TrackResult<bool> {
        self.store
            .has_plain_signature_by(&owner.owner_ref(), user.id)
    }

    /// Signature by `user` whose stored physician matches the user's
    /// *current* physician linkage, re-validated live rather than from
    /// the snapshot.
    pub fn signed_by_user<R: Trackable>(
        &self,
        owner: &R,
        user: &User,
    ) -> TrackResult<Option<Signature>> {
        self.store
            .find_by_user(&owner.owner_ref(), user.id, user.physician_id)
    }

    /// Signature countersigned by exactly this physician.
    pub fn signed_by_physician<R: Trackable>(
        &self,
        owner: &R,
        physician: &Physician,
    ) -> TrackResult<Option<Signature>> {
        self.store.find_by_physician(&owner.owner_ref(), physician.id)
    }

    /// Signature matching a discipline key. The `physician` key matches
    /// any physician-bearing signature regardless of role name; other
    /// keys match plain signatures whose signer's live root role name
    /// equals the resolved role name. Signers the directory can no longer
    /// resolve never match.
    pub fn signed_by_discipline<R: Trackable>(
        &self,
        owner: &R,
        discipline: &str,
    ) -> TrackResult<Option<Signature>> {
        let signatures = self.store.signatures_for(&owner.owner_ref())?;
        if discipline == PHYSICIAN_DISCIPLINE {
            return Ok(signatures.into_iter().find(|s| s.physician_id.is_some()));
        }

        let role_name = self.taxonomy.role_name(discipline);
        for signature in signatures {
            if signature.physician_id.is_some() {
                continue;
            }
            let Some(signer) = self.directory.user(signature.user_id) else {
                continue;
            };
            let root = signer.role.as_ref().map(|r| r.root().name.clone());
            if root == role_name {
                return Ok(Some(signature));
            }
        }
        Ok(None)
    }

    /// Type-level query: ids of records with no physician signature.
    /// Records carrying only plain signatures still count as unsigned
    /// here.
    pub fn unsigned_items<R: Trackable>(&self) -> TrackResult<Vec<i64>> {
        self.store.unsigned_owner_ids(&R::handle())
    }

    /// All signatures for a record, chronological.
    pub fn signatures_for<R: Trackable>(&self, owner: &R) -> TrackResult<Vec<Signature>> {
        self.store.signatures_for(&owner.owner_ref())
    }
}

/// Whether a type name has opted into tracking.
pub fn has_signature_tracking(type_name: &str) -> bool {
    registry::global().is_registered(type_name)
}
