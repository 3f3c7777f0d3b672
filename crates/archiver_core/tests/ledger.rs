use archiver_core::{Candidate, CaptureLedger, CommitOutcome, MediaKind};

fn candidate(detail: &str, url: &str) -> Candidate {
    Candidate {
        detail_key: detail.to_string(),
        kind: MediaKind::Image,
        url: url.to_string(),
        intrinsic_width: None,
        display_width: None,
    }
}

#[test]
fn accepts_each_key_at_most_once() {
    let mut ledger = CaptureLedger::new(10);

    assert_eq!(
        ledger.try_commit(&candidate("k1", "http://h/a.jpg"), 1),
        CommitOutcome::Accepted
    );
    assert_eq!(
        ledger.try_commit(&candidate("k1", "http://h/other.jpg"), 2),
        CommitOutcome::Duplicate
    );
    assert_eq!(ledger.len(), 1);

    // Committed items are immutable: the first source wins.
    let item = ledger.items().next().unwrap();
    assert_eq!(item.source_url, "http://h/a.jpg");
    assert_eq!(item.accepted_at, 1);
}

#[test]
fn enforces_item_cap() {
    let mut ledger = CaptureLedger::new(2);
    assert_eq!(
        ledger.try_commit(&candidate("k1", "http://h/1.jpg"), 1),
        CommitOutcome::Accepted
    );
    assert_eq!(
        ledger.try_commit(&candidate("k2", "http://h/2.jpg"), 2),
        CommitOutcome::Accepted
    );
    assert!(ledger.at_cap());
    assert_eq!(
        ledger.try_commit(&candidate("k3", "http://h/3.jpg"), 3),
        CommitOutcome::CapReached
    );
    assert_eq!(ledger.len(), 2);
}

#[test]
fn rejects_placeholder_and_low_quality_sources() {
    let mut ledger = CaptureLedger::new(10);

    let placeholder = candidate("k1", &format!("data:image/jpeg;base64,{}", "A".repeat(64)));
    assert_eq!(
        ledger.try_commit(&placeholder, 1),
        CommitOutcome::Placeholder
    );

    let upscaled = Candidate {
        intrinsic_width: Some(300),
        display_width: Some(500),
        ..candidate("k2", "http://h/upscaled.jpg")
    };
    assert_eq!(ledger.try_commit(&upscaled, 2), CommitOutcome::LowQuality);

    // Rejections leave no trace: the key may settle again later.
    assert!(!ledger.contains("k1"));
    assert!(!ledger.contains("k2"));
    assert!(ledger.is_empty());
}

#[test]
fn quality_gate_needs_both_widths() {
    let mut ledger = CaptureLedger::new(10);
    let no_hints = Candidate {
        intrinsic_width: None,
        display_width: Some(500),
        ..candidate("k1", "http://h/unknown.jpg")
    };
    assert_eq!(ledger.try_commit(&no_hints, 1), CommitOutcome::Accepted);
}
