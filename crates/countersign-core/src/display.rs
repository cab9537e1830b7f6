//! Human-readable rendering of a signing event.

use crate::identity::Directory;
use crate::model::{Signature, SignedRole};

/// Renders the fixed-format sentence for a signature.
///
/// The parenthetical label re-derives the physician's *current*
/// credentials through the directory, while `static_role` stays frozen at
/// what it was when the signature was recorded. That asymmetry is
/// intentional: the snapshot is the audit trail, the label is the
/// current-state wording.
pub fn describe(signature: &Signature, directory: &impl Directory) -> String {
    let signed_label = match signature.physician_id {
        Some(id) => match directory.physician(id) {
            Some(physician) => SignedRole::of_physician(&physician),
            // Physician row gone; the id still marks it a clinical signature.
            None => SignedRole::Physician,
        },
        None => SignedRole::User,
    };
    let signed_date = signature.signed_date();
    let created_date = signature.created_at.date_naive();
    format!(
        "{} {} ({}) signed on {}. Recorded by {} on {}.",
        signature.static_role.as_deref().unwrap_or(""),
        signature.static_name,
        signed_label,
        signed_date.format("%Y-%m-%d"),
        signature.static_user_name,
        created_date.format("%Y-%m-%d"),
    )
}
