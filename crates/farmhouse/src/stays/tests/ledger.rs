use super::common::*;
use std::sync::Arc;
use std::thread;

use crate::stays::domain::FamilyId;
use crate::stays::error::StayError;
use crate::stays::ledger::ScoreLedger;
use crate::stays::repository::RepositoryError;

#[test]
fn debits_may_drive_a_score_negative() {
    let (store, families) = store_with(&[("Okafor", 10)]);
    let ledger = ScoreLedger::new(store.clone());

    let updated = ledger.debit(families[0].id, 25).expect("debits");

    assert_eq!(updated.priority_score, -15);
    assert_eq!(ledger.balance(families[0].id).expect("reads"), -15);
}

#[test]
fn concurrent_deltas_are_never_lost() {
    let (store, families) = store_with(&[("Okafor", 250)]);
    let ledger = ScoreLedger::new(store.clone());
    let id = families[0].id;

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    if worker % 2 == 0 {
                        ledger.credit(id, 3).expect("credits");
                    } else {
                        ledger.debit(id, 5).expect("debits");
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker finished");
    }

    assert_eq!(score(&store, id), 250 + 4 * 25 * 3 - 4 * 25 * 5);
}

#[test]
fn reset_opens_a_new_season_for_everyone() {
    let (store, families) = store_with(&[("Okafor", 12), ("Lindqvist", 480), ("Baptiste", -30)]);
    let ledger = ScoreLedger::new(store.clone());

    let reset = ledger.reset_all(250).expect("resets");

    assert_eq!(reset.len(), 3);
    for family in &families {
        assert_eq!(score(&store, family.id), 250);
    }
}

#[test]
fn standings_rank_by_score_then_registry_order() {
    let (store, _) = store_with(&[("Okafor", 120), ("Lindqvist", 200), ("Baptiste", 120)]);
    let ledger = ScoreLedger::new(store);

    let standings = ledger.standings().expect("ranks");
    let order: Vec<(usize, &str)> = standings
        .iter()
        .map(|standing| (standing.rank, standing.name.as_str()))
        .collect();

    assert_eq!(
        order,
        vec![(1, "Lindqvist"), (2, "Okafor"), (3, "Baptiste")]
    );
}

#[test]
fn adjusting_an_unknown_household_is_not_found() {
    let (store, _) = store_with(&[("Okafor", 120)]);
    let ledger = ScoreLedger::new(store);
    assert!(matches!(
        ledger.adjust(FamilyId(42), 10),
        Err(StayError::NotFound { entity: "family", .. })
    ));
}

#[test]
fn overflowing_adjustment_is_refused_and_store_stays_usable() {
    let (store, families) = store_with(&[("Okafor", 250)]);
    let ledger = ScoreLedger::new(store.clone());
    let id = families[0].id;

    assert!(matches!(
        ledger.adjust(id, i64::MAX),
        Err(StayError::Persistence(RepositoryError::ScoreOverflow(family))) if family == id
    ));
    assert_eq!(ledger.balance(id).expect("store still readable"), 250);

    let updated = ledger.adjust(id, -50).expect("later writes land");
    assert_eq!(updated.priority_score, 200);
}

#[test]
fn store_outage_surfaces_as_persistence_failure() {
    let ledger = ScoreLedger::new(Arc::new(UnavailableStore));
    assert!(matches!(
        ledger.credit(FamilyId(1), 10),
        Err(StayError::Persistence(RepositoryError::Unavailable(_)))
    ));
}
