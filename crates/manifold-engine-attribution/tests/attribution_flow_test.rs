//! Full-state verification of the ledger -> weigher -> proof chain flow.
//!
//! Covers:
//! 1. Weight-sum invariant across decay and smoothing settings
//! 2. Proof generation/verification over a real snapshot
//! 3. Serialization roundtrip of proofs and snapshots

use manifold_engine_attribution::{
    verify, AttributionSnapshot, AttributionWeigher, ContributionEvent, ContributionLedger,
    ProofChain, WeigherConfig,
};

fn seeded_ledger() -> ContributionLedger {
    let ledger = ContributionLedger::new();
    let events = [
        ("alice", 100.0, "documents", 1),
        ("bob", 50.0, "documents", 1),
        ("carol", 30.0, "reviews", 2),
        ("dan", 10.0, "documents", 3),
        ("erin", 5.0, "reviews", 3),
        ("alice", 25.0, "reviews", 3),
    ];
    for (id, amount, category, period) in events {
        ledger
            .append(ContributionEvent::new(id, amount, category, period))
            .unwrap();
    }
    ledger
}

#[test]
fn end_to_end_snapshot_commits_and_verifies() {
    let ledger = seeded_ledger();
    let weigher = AttributionWeigher::new(WeigherConfig::default()).unwrap();

    let snapshot = weigher.snapshot(&ledger, 4);
    assert_eq!(snapshot.weights.len(), 5);
    assert!(snapshot.weights_sum_to_one());

    let records = snapshot.to_records();
    let chain = ProofChain::build(&records).unwrap();
    let root = chain.root();

    for (i, record) in records.iter().enumerate() {
        let proof = chain.generate_proof(i).unwrap();
        assert!(verify(record, &proof, &root), "record {i} must verify");
    }
}

#[test]
fn appended_event_changes_the_root() {
    let ledger = seeded_ledger();
    let weigher = AttributionWeigher::new(WeigherConfig::default()).unwrap();

    let before = ProofChain::build(&weigher.snapshot(&ledger, 4).to_records())
        .unwrap()
        .root();

    ledger
        .append(ContributionEvent::new("frank", 40.0, "documents", 4))
        .unwrap();

    let after = ProofChain::build(&weigher.snapshot(&ledger, 4).to_records())
        .unwrap()
        .root();

    assert_ne!(before, after, "new contributions must invalidate old roots");
}

#[test]
fn snapshot_and_proof_json_roundtrip() {
    let ledger = seeded_ledger();
    let weigher = AttributionWeigher::new(WeigherConfig::default()).unwrap();
    let snapshot = weigher.snapshot(&ledger, 4);

    // Bit-exact f64 recovery relies on serde_json's float_roundtrip feature.
    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: AttributionSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot, restored);

    let records = snapshot.to_records();
    let chain = ProofChain::build(&records).unwrap();
    let proof = chain.generate_proof(0).unwrap();

    let json = serde_json::to_string(&proof).unwrap();
    let restored = serde_json::from_str(&json).unwrap();
    assert_eq!(proof, restored);
    assert!(verify(&records[0], &restored, &chain.root()));
}

#[test]
fn concurrent_appends_all_land() {
    let ledger = ContributionLedger::new();
    let mut handles = Vec::new();
    for t in 0..8 {
        let ledger = ledger.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..50 {
                ledger
                    .append(ContributionEvent::new(
                        format!("worker-{t}"),
                        i as f64,
                        "documents",
                        1,
                    ))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(ledger.len(), 400);
}
