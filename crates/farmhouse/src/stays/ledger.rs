use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::{Family, FamilyId};
use super::error::StayError;
use super::repository::{Changeset, Mutation, StayRepository};

/// Leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub family_id: FamilyId,
    pub name: String,
    pub priority_score: i64,
}

/// Reads and writes household priority scores.
///
/// Every write is a signed delta applied by the store inside its commit, so
/// two concurrent writers can never overwrite each other's change. Scores have
/// no floor.
pub struct ScoreLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for ScoreLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ScoreLedger<S>
where
    S: StayRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn family(&self, family: FamilyId) -> Result<Family, StayError> {
        self.store
            .family(family)?
            .ok_or_else(|| StayError::not_found("family", family))
    }

    pub fn balance(&self, family: FamilyId) -> Result<i64, StayError> {
        Ok(self.family(family)?.priority_score)
    }

    pub fn credit(&self, family: FamilyId, amount: i64) -> Result<Family, StayError> {
        self.apply_delta(family, amount)
    }

    pub fn debit(&self, family: FamilyId, amount: i64) -> Result<Family, StayError> {
        self.apply_delta(family, -amount)
    }

    /// Manual bonus or fine. Privileged; the caller performs the role check.
    pub fn adjust(&self, family: FamilyId, delta: i64) -> Result<Family, StayError> {
        self.apply_delta(family, delta)
    }

    /// Sets every household to `score`, opening a new scoring period.
    pub fn reset_all(&self, score: i64) -> Result<Vec<Family>, StayError> {
        let mut changeset = Changeset::new();
        changeset.apply(Mutation::ResetScores { score });
        let receipt = self.store.commit(changeset)?;
        info!(score, families = receipt.families.len(), "priority scores reset");
        Ok(receipt.families)
    }

    /// Households ordered by score, highest first; ties keep registry order.
    pub fn standings(&self) -> Result<Vec<Standing>, StayError> {
        let mut families = self.store.families()?;
        families.sort_by(|a, b| {
            b.priority_score
                .cmp(&a.priority_score)
                .then(a.id.cmp(&b.id))
        });
        Ok(families
            .into_iter()
            .enumerate()
            .map(|(index, family)| Standing {
                rank: index + 1,
                family_id: family.id,
                name: family.name,
                priority_score: family.priority_score,
            })
            .collect())
    }

    fn apply_delta(&self, family: FamilyId, delta: i64) -> Result<Family, StayError> {
        let current = self.family(family)?;
        if delta == 0 {
            return Ok(current);
        }

        let mut changeset = Changeset::new();
        changeset.adjust_score(family, delta);
        let receipt = self.store.commit(changeset)?;
        let updated = receipt
            .family(family)
            .cloned()
            .ok_or_else(|| StayError::not_found("family", family))?;

        info!(
            family = %family,
            delta,
            score = updated.priority_score,
            "priority score adjusted"
        );
        Ok(updated)
    }
}
