use anyhow::Result;
use chrono::NaiveDate;
use countersign_core::{
    describe, tracking::has_signature_tracking, FixedToday, MemoryDirectory, Physician, Role,
    SignatureDraft, SignatureTracker, StaticTaxonomy, Store, Trackable, TrackError, User,
    PHYSICIAN_DISCIPLINE,
};

struct Chart {
    id: i64,
}

impl Trackable for Chart {
    const TYPE_NAME: &'static str = "Chart";
    const TABLE: &'static str = "charts";

    fn record_id(&self) -> i64 {
        self.id
    }
}

fn alice() -> User {
    User {
        id: 1,
        name: "Alice Moore".into(),
        user_name: "amoore".into(),
        role: Some(Role::with_parent("Charge Nurse", Role::named("Nursing"))),
        physician_id: None,
    }
}

fn dr_bob() -> Physician {
    Physician {
        id: 9,
        name: "Robert Hale".into(),
        nurse_practitioner: false,
        medical_director: false,
    }
}

/// Account linked to Dr. Bob's physician identity.
fn carol() -> User {
    User {
        id: 2,
        name: "Carol Diaz".into(),
        user_name: "cdiaz".into(),
        role: Some(Role::named("Medical")),
        physician_id: Some(9),
    }
}

fn directory() -> MemoryDirectory {
    let mut dir = MemoryDirectory::new();
    dir.insert_user(alice());
    dir.insert_user(carol());
    dir.insert_physician(dr_bob());
    dir
}

fn taxonomy() -> StaticTaxonomy {
    StaticTaxonomy::new()
        .with("nursing", "Nursing")
        .with(PHYSICIAN_DISCIPLINE, "Physician")
}

fn tracker_with(
    dir: MemoryDirectory,
    chart_ids: &[i64],
) -> Result<SignatureTracker<MemoryDirectory, StaticTaxonomy>> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.execute_batch("CREATE TABLE charts (id INTEGER PRIMARY KEY, title TEXT)")?;
    for id in chart_ids {
        store.execute_batch(&format!("INSERT INTO charts(id) VALUES ({id})"))?;
    }
    let tracker = SignatureTracker::new(store, dir, taxonomy())
        .with_today(Box::new(FixedToday(date(2024, 2, 1))));
    tracker.enable_tracking::<Chart>()?;
    Ok(tracker)
}

fn tracker(chart_ids: &[i64]) -> Result<SignatureTracker<MemoryDirectory, StaticTaxonomy>> {
    tracker_with(directory(), chart_ids)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn plain_signature_sets_flags_but_stays_unsigned() -> Result<()> {
    let tracker = tracker(&[1])?;
    let chart = Chart { id: 1 };

    let sig = tracker.track(&chart, &alice(), None, None)?;
    assert_eq!(sig.physician_id, None);
    assert_eq!(sig.effective_date, None);
    assert_eq!(sig.static_role.as_deref(), Some("Nursing"));

    assert!(tracker.has_signature(&chart)?);
    assert!(!tracker.has_physician_signature(&chart)?);
    // Plain signatures do not count as signed for the unsigned-items query.
    assert_eq!(tracker.unsigned_items::<Chart>()?, vec![1]);
    Ok(())
}

#[test]
fn plain_signature_drops_a_supplied_effective_date() -> Result<()> {
    let tracker = tracker(&[1])?;
    let chart = Chart { id: 1 };
    let sig = tracker.track(&chart, &alice(), None, Some(date(2024, 1, 5)))?;
    assert_eq!(sig.effective_date, None);
    Ok(())
}

#[test]
fn physician_signature_marks_chart_signed() -> Result<()> {
    let tracker = tracker(&[1, 2])?;
    let chart = Chart { id: 1 };

    let sig = tracker.track(&chart, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;
    assert_eq!(sig.static_role.as_deref(), Some("Physician"));
    assert_eq!(sig.static_name, "Robert Hale");
    assert_eq!(sig.static_user_name, "amoore");
    assert_eq!(sig.effective_date, Some(date(2024, 1, 5)));

    assert!(tracker.has_physician_signature(&chart)?);
    assert_eq!(tracker.unsigned_items::<Chart>()?, vec![2]);
    Ok(())
}

#[test]
fn physician_signature_defaults_effective_date_to_today() -> Result<()> {
    let tracker = tracker(&[1])?;
    let sig = tracker.track(&Chart { id: 1 }, &alice(), Some(&dr_bob()), None)?;
    assert_eq!(sig.effective_date, Some(date(2024, 2, 1)));
    Ok(())
}

#[test]
fn physician_defaults_from_the_signing_users_account() -> Result<()> {
    let tracker = tracker(&[1])?;
    let sig = tracker.track(&Chart { id: 1 }, &carol(), None, None)?;
    assert_eq!(sig.physician_id, Some(9));
    assert_eq!(sig.effective_date, Some(date(2024, 2, 1)));
    assert_eq!(sig.static_name, "Robert Hale");
    assert_eq!(sig.static_user_name, "cdiaz");
    Ok(())
}

#[test]
fn missing_owner_fails_validation_and_persists_nothing() -> Result<()> {
    let tracker = tracker(&[1])?;
    let user = alice();
    let err = tracker
        .create(SignatureDraft {
            owner: None,
            user: Some(&user),
            physician: None,
            effective_date: None,
        })
        .unwrap_err();
    assert!(matches!(err, TrackError::MissingOwner));
    assert!(err.is_validation());
    assert!(tracker.signatures_for(&Chart { id: 1 })?.is_empty());
    Ok(())
}

#[test]
fn missing_user_fails_validation() -> Result<()> {
    let tracker = tracker(&[1])?;
    let err = tracker
        .create(SignatureDraft {
            owner: Some(Chart { id: 1 }.owner_ref()),
            user: None,
            physician: None,
            effective_date: None,
        })
        .unwrap_err();
    assert!(matches!(err, TrackError::MissingUser));
    Ok(())
}

#[test]
fn snapshot_stays_frozen_while_display_label_goes_live() -> Result<()> {
    let tracker = tracker(&[1])?;
    let sig = tracker.track(&Chart { id: 1 }, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;
    assert_eq!(sig.static_role.as_deref(), Some("Physician"));

    // Dr. Bob later becomes a nurse practitioner. The stored snapshot
    // must not move, but the rendered label re-reads his credentials.
    let mut promoted = MemoryDirectory::new();
    promoted.insert_physician(Physician {
        nurse_practitioner: true,
        ..dr_bob()
    });

    let stored = &tracker.signatures_for(&Chart { id: 1 })?[0];
    assert_eq!(stored.static_role.as_deref(), Some("Physician"));
    let sentence = describe(stored, &promoted);
    assert!(sentence.contains("(Nurse Practitioner)"), "{sentence}");
    assert!(sentence.starts_with("Physician Robert Hale"), "{sentence}");
    Ok(())
}

#[test]
fn countersigned_entry_does_not_count_as_signed_by_user() -> Result<()> {
    let tracker = tracker(&[1])?;
    let chart = Chart { id: 1 };
    tracker.track(&chart, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;
    assert!(!tracker.has_signature_by(&chart, &alice())?);

    tracker.track(&chart, &alice(), None, None)?;
    assert!(tracker.has_signature_by(&chart, &alice())?);
    Ok(())
}

#[test]
fn signed_by_user_revalidates_current_physician_linkage() -> Result<()> {
    let tracker = tracker(&[1])?;
    let chart = Chart { id: 1 };
    tracker.track(&chart, &alice(), None, None)?;

    assert!(tracker.signed_by_user(&chart, &alice())?.is_some());

    // The same account later linked to a physician no longer matches its
    // old plain signature.
    let mut linked = alice();
    linked.physician_id = Some(9);
    assert!(tracker.signed_by_user(&chart, &linked)?.is_none());
    Ok(())
}

#[test]
fn signed_by_physician_matches_only_that_physician() -> Result<()> {
    let tracker = tracker(&[1])?;
    let chart = Chart { id: 1 };
    tracker.track(&chart, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;

    assert!(tracker.signed_by_physician(&chart, &dr_bob())?.is_some());
    let other = Physician {
        id: 10,
        name: "Dana Wu".into(),
        nurse_practitioner: false,
        medical_director: false,
    };
    assert!(tracker.signed_by_physician(&chart, &other)?.is_none());
    Ok(())
}

#[test]
fn discipline_key_matches_live_root_role_of_plain_signer() -> Result<()> {
    let tracker = tracker(&[1])?;
    let chart = Chart { id: 1 };
    tracker.track(&chart, &alice(), None, None)?;

    assert!(tracker.signed_by_discipline(&chart, "nursing")?.is_some());
    assert!(tracker.signed_by_discipline(&chart, "chaplain")?.is_none());
    // No physician-bearing signature yet.
    assert!(tracker
        .signed_by_discipline(&chart, PHYSICIAN_DISCIPLINE)?
        .is_none());
    Ok(())
}

#[test]
fn physician_discipline_matches_any_physician_signature() -> Result<()> {
    let tracker = tracker(&[1])?;
    let chart = Chart { id: 1 };
    tracker.track(&chart, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;

    let hit = tracker
        .signed_by_discipline(&chart, PHYSICIAN_DISCIPLINE)?
        .unwrap();
    assert_eq!(hit.physician_id, Some(9));
    // The physician-bearing entry never satisfies a non-physician key.
    assert!(tracker.signed_by_discipline(&chart, "nursing")?.is_none());
    Ok(())
}

#[test]
fn discipline_match_skips_signers_the_directory_lost() -> Result<()> {
    let mut dir = directory();
    dir.insert_user(User {
        id: 30,
        name: "Gone Later".into(),
        user_name: "gone".into(),
        role: Some(Role::named("Nursing")),
        physician_id: None,
    });
    let tracker = tracker_with(dir, &[1])?;
    let chart = Chart { id: 1 };
    let ghost = User {
        id: 31, // never inserted into the directory
        name: "Ghost".into(),
        user_name: "ghost".into(),
        role: Some(Role::named("Nursing")),
        physician_id: None,
    };
    tracker.track(&chart, &ghost, None, None)?;
    assert!(tracker.signed_by_discipline(&chart, "nursing")?.is_none());
    Ok(())
}

#[test]
fn unsigned_items_mixes_plain_and_physician_signatures() -> Result<()> {
    let tracker = tracker(&[1, 2, 3])?;
    tracker.track(&Chart { id: 1 }, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;
    tracker.track(&Chart { id: 2 }, &alice(), None, None)?;
    assert_eq!(tracker.unsigned_items::<Chart>()?, vec![2, 3]);
    Ok(())
}

#[test]
fn deleting_an_owner_cascades_to_its_signatures() -> Result<()> {
    let tracker = tracker(&[1, 2])?;
    let chart = Chart { id: 1 };
    tracker.track(&chart, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;
    tracker.track(&Chart { id: 2 }, &alice(), None, None)?;

    tracker.store().execute_batch("DELETE FROM charts WHERE id = 1")?;

    assert!(tracker.signatures_for(&chart)?.is_empty());
    assert_eq!(tracker.signatures_for(&Chart { id: 2 })?.len(), 1);
    Ok(())
}

#[test]
fn opting_in_registers_the_type() -> Result<()> {
    let _tracker = tracker(&[])?;
    assert!(has_signature_tracking("Chart"));
    assert!(!has_signature_tracking("Invoice"));
    Ok(())
}

#[test]
fn signatures_survive_reopening_an_on_disk_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("signatures.db");

    {
        let store = Store::open(&path)?;
        store.init_schema()?;
        store.execute_batch("CREATE TABLE charts (id INTEGER PRIMARY KEY)")?;
        store.execute_batch("INSERT INTO charts(id) VALUES (1)")?;
        let tracker = SignatureTracker::new(store, directory(), taxonomy());
        tracker.enable_tracking::<Chart>()?;
        tracker.track(&Chart { id: 1 }, &alice(), Some(&dr_bob()), Some(date(2024, 1, 5)))?;
    }

    let store = Store::open(&path)?;
    let tracker = SignatureTracker::new(store, directory(), taxonomy());
    let sigs = tracker.signatures_for(&Chart { id: 1 })?;
    assert_eq!(sigs.len(), 1);
    assert_eq!(sigs[0].static_role.as_deref(), Some("Physician"));
    assert_eq!(sigs[0].effective_date, Some(date(2024, 1, 5)));
    Ok(())
}
