//! Candidate pool.
//!
//! The pool is the single source of truth for "has this candidate already
//! been tried". Records live in an insertion-ordered arena with a key index;
//! statuses only ever move forward, so a held or excluded candidate can never
//! be handed out again.

use crate::error::PoolError;
use crate::models::{CandidateId, CandidateRecord, CandidateStatus, TerminalCandidate};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Arena of candidate records keyed by identity.
#[derive(Debug, Default)]
pub struct CandidatePool {
    records: Vec<CandidateRecord>,
    index: HashMap<CandidateId, usize>,
    /// Every record before this position has left `Untried`.
    cursor: usize,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from records, failing on the first duplicate identity.
    pub fn from_records(
        records: impl IntoIterator<Item = CandidateRecord>,
    ) -> Result<Self, PoolError> {
        let mut pool = Self::new();
        for record in records {
            pool.add(record)?;
        }
        Ok(pool)
    }

    /// Add a candidate. Fails with `DuplicateKey` if the identity is present.
    pub fn add(&mut self, record: CandidateRecord) -> Result<(), PoolError> {
        if self.index.contains_key(&record.id) {
            return Err(PoolError::DuplicateKey(record.id));
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &CandidateId) -> Option<&CandidateRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    /// First untried candidate in insertion order; `None` means exhausted.
    pub fn next_untried(&self) -> Option<&CandidateRecord> {
        self.untried_position().map(|i| &self.records[i])
    }

    pub fn untried_count(&self) -> usize {
        self.records[self.cursor..]
            .iter()
            .filter(|r| r.status == CandidateStatus::Untried)
            .count()
    }

    /// Atomically take the next untried candidate and move it to `Screening`.
    ///
    /// Returns a snapshot of the claimed record, or `None` when exhausted.
    pub fn claim_next(&mut self) -> Option<CandidateRecord> {
        let position = self.untried_position()?;
        self.cursor = position + 1;

        let record = &mut self.records[position];
        record.status = CandidateStatus::Screening;
        debug!("Claimed candidate {} for screening", record.id);
        Some(record.clone())
    }

    /// Untried or Screening -> Excluded.
    pub fn mark_excluded(
        &mut self,
        id: &CandidateId,
        reason: impl Into<String>,
    ) -> Result<&CandidateRecord, PoolError> {
        self.transition(id, CandidateStatus::Excluded, Some(reason.into()))
    }

    /// Screening -> Selected.
    pub fn mark_selected(&mut self, id: &CandidateId) -> Result<&CandidateRecord, PoolError> {
        self.transition(id, CandidateStatus::Selected, None)
    }

    /// Selected -> Evaluated.
    pub fn mark_evaluated(&mut self, id: &CandidateId) -> Result<&CandidateRecord, PoolError> {
        self.transition(id, CandidateStatus::Evaluated, None)
    }

    /// Evaluated -> Held.
    pub fn mark_held(
        &mut self,
        id: &CandidateId,
        reason: impl Into<String>,
    ) -> Result<&CandidateRecord, PoolError> {
        self.transition(id, CandidateStatus::Held, Some(reason.into()))
    }

    /// Evaluated -> Invested.
    pub fn mark_invested(
        &mut self,
        id: &CandidateId,
        reason: impl Into<String>,
    ) -> Result<&CandidateRecord, PoolError> {
        self.transition(id, CandidateStatus::Invested, Some(reason.into()))
    }

    /// Held and Excluded candidates with their reasons, in insertion order.
    pub fn terminal_records(&self) -> Vec<TerminalCandidate> {
        self.records
            .iter()
            .filter(|r| matches!(r.status, CandidateStatus::Held | CandidateStatus::Excluded))
            .map(|r| TerminalCandidate {
                id: r.id.clone(),
                name: r.name.clone(),
                status: r.status,
                reason: r.reason.clone().unwrap_or_default(),
            })
            .collect()
    }

    fn untried_position(&self) -> Option<usize> {
        self.records[self.cursor..]
            .iter()
            .position(|r| r.status == CandidateStatus::Untried)
            .map(|offset| self.cursor + offset)
    }

    fn transition(
        &mut self,
        id: &CandidateId,
        to: CandidateStatus,
        reason: Option<String>,
    ) -> Result<&CandidateRecord, PoolError> {
        let &position = self
            .index
            .get(id)
            .ok_or_else(|| PoolError::UnknownCandidate(id.clone()))?;

        let record = &mut self.records[position];
        if !record.status.can_transition_to(to) {
            return Err(PoolError::InvalidTransition {
                id: id.clone(),
                from: record.status,
                to,
            });
        }

        debug!("Candidate {}: {} -> {}", id, record.status, to);
        record.status = to;
        if to.is_terminal() {
            record.reason = reason;
        }
        Ok(record)
    }
}

/// Shared handle to a pool.
///
/// Every method is one critical section with no await point inside, so each
/// per-candidate mutation is atomic with respect to other holders.
#[derive(Debug, Clone)]
pub struct SharedPool {
    inner: Arc<Mutex<CandidatePool>>,
}

impl SharedPool {
    pub fn new(pool: CandidatePool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn untried_count(&self) -> usize {
        self.inner.lock().await.untried_count()
    }

    pub async fn claim_next(&self) -> Option<CandidateRecord> {
        self.inner.lock().await.claim_next()
    }

    pub async fn mark_excluded(
        &self,
        id: &CandidateId,
        reason: impl Into<String>,
    ) -> Result<CandidateRecord, PoolError> {
        self.inner
            .lock()
            .await
            .mark_excluded(id, reason)
            .cloned()
    }

    pub async fn mark_selected(&self, id: &CandidateId) -> Result<CandidateRecord, PoolError> {
        self.inner.lock().await.mark_selected(id).cloned()
    }

    pub async fn mark_evaluated(&self, id: &CandidateId) -> Result<CandidateRecord, PoolError> {
        self.inner.lock().await.mark_evaluated(id).cloned()
    }

    pub async fn mark_held(
        &self,
        id: &CandidateId,
        reason: impl Into<String>,
    ) -> Result<CandidateRecord, PoolError> {
        self.inner.lock().await.mark_held(id, reason).cloned()
    }

    pub async fn mark_invested(
        &self,
        id: &CandidateId,
        reason: impl Into<String>,
    ) -> Result<CandidateRecord, PoolError> {
        self.inner.lock().await.mark_invested(id, reason).cloned()
    }

    #[cfg(test)]
    pub async fn get(&self, id: &CandidateId) -> Option<CandidateRecord> {
        self.inner.lock().await.get(id).cloned()
    }

    pub async fn terminal_records(&self) -> Vec<TerminalCandidate> {
        self.inner.lock().await.terminal_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateProfile;

    fn record(name: &str) -> CandidateRecord {
        CandidateRecord::new(name, CandidateProfile::default())
    }

    fn pool_of(names: &[&str]) -> CandidatePool {
        CandidatePool::from_records(names.iter().map(|n| record(n))).unwrap()
    }

    #[test]
    fn test_add_rejects_duplicate_key() {
        let mut pool = pool_of(&["Riiid"]);
        let err = pool.add(record("riiid")).unwrap_err();
        assert_eq!(err, PoolError::DuplicateKey(CandidateId::new("Riiid")));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_claim_next_uses_insertion_order() {
        let mut pool = pool_of(&["Zeta", "Alpha", "Mid"]);

        let claimed = pool.claim_next().unwrap();
        assert_eq!(claimed.name, "Zeta");
        assert_eq!(claimed.status, CandidateStatus::Screening);
        assert_eq!(
            pool.get(&CandidateId::new("Zeta")).unwrap().status,
            CandidateStatus::Screening
        );
        assert_eq!(pool.claim_next().unwrap().name, "Alpha");
    }

    #[test]
    fn test_next_untried_does_not_claim() {
        let mut pool = pool_of(&["A", "B"]);
        assert_eq!(pool.next_untried().unwrap().name, "A");
        assert_eq!(pool.next_untried().unwrap().name, "A");
        assert_eq!(pool.untried_count(), 2);

        pool.claim_next().unwrap();
        assert_eq!(pool.next_untried().unwrap().name, "B");
        assert_eq!(pool.untried_count(), 1);
    }

    #[test]
    fn test_claim_next_exhausts() {
        let mut pool = pool_of(&["A", "B"]);
        assert!(pool.claim_next().is_some());
        assert!(pool.claim_next().is_some());
        assert!(pool.claim_next().is_none());
        assert!(pool.next_untried().is_none());
        assert_eq!(pool.untried_count(), 0);
        assert!(pool
            .records()
            .iter()
            .all(|r| r.status == CandidateStatus::Screening));
    }

    #[test]
    fn test_excluding_untried_candidate_skips_it() {
        let mut pool = pool_of(&["A", "B", "C"]);
        pool.mark_excluded(&CandidateId::new("B"), "no funding data")
            .unwrap();

        assert_eq!(pool.untried_count(), 2);
        assert_eq!(pool.claim_next().unwrap().name, "A");
        assert_eq!(pool.claim_next().unwrap().name, "C");
        assert!(pool.claim_next().is_none());
    }

    #[test]
    fn test_full_forward_lifecycle() {
        let mut pool = pool_of(&["A"]);
        let id = CandidateId::new("A");

        pool.claim_next().unwrap();
        pool.mark_selected(&id).unwrap();
        pool.mark_evaluated(&id).unwrap();
        let record = pool.mark_invested(&id, "composite 80.00").unwrap();

        assert_eq!(record.status, CandidateStatus::Invested);
        assert_eq!(record.reason.as_deref(), Some("composite 80.00"));
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut pool = pool_of(&["A"]);
        let id = CandidateId::new("A");

        // Untried cannot be held or invested directly.
        let err = pool.mark_held(&id, "nope").unwrap_err();
        assert_eq!(
            err,
            PoolError::InvalidTransition {
                id: id.clone(),
                from: CandidateStatus::Untried,
                to: CandidateStatus::Held,
            }
        );

        pool.mark_excluded(&id, "ineligible").unwrap();
        assert!(pool.mark_selected(&id).is_err());
        assert!(pool.mark_excluded(&id, "again").is_err());
        assert_eq!(pool.get(&id).unwrap().status, CandidateStatus::Excluded);
    }

    #[test]
    fn test_unknown_candidate() {
        let mut pool = pool_of(&["A"]);
        let err = pool.mark_selected(&CandidateId::new("ghost")).unwrap_err();
        assert_eq!(err, PoolError::UnknownCandidate(CandidateId::new("ghost")));
    }

    #[test]
    fn test_terminal_records_carry_reasons() {
        let mut pool = pool_of(&["A", "B", "C"]);
        let a = CandidateId::new("A");
        let b = CandidateId::new("B");

        pool.mark_excluded(&a, "purpose unclear").unwrap();
        pool.claim_next().unwrap(); // B
        pool.mark_selected(&b).unwrap();
        pool.mark_evaluated(&b).unwrap();
        pool.mark_held(&b, "composite 64.00 below threshold 70.00")
            .unwrap();

        let terminal = pool.terminal_records();
        assert_eq!(terminal.len(), 2);
        assert_eq!(terminal[0].status, CandidateStatus::Excluded);
        assert_eq!(terminal[0].reason, "purpose unclear");
        assert_eq!(terminal[1].status, CandidateStatus::Held);
        assert!(terminal[1].reason.contains("64.00"));
    }

    #[tokio::test]
    async fn test_concurrent_claims_never_share_a_candidate() {
        let names: Vec<String> = (0..50).map(|i| format!("startup {}", i)).collect();
        let pool = SharedPool::new(
            CandidatePool::from_records(names.iter().map(|n| record(n))).unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let mut claimed = Vec::new();
                while let Some(record) = pool.claim_next().await {
                    claimed.push(record.id);
                    tokio::task::yield_now().await;
                }
                claimed
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(total, 50);
        assert_eq!(all.len(), 50);
    }
}
