//! Claim lifecycle
//!
//! Claims start `Pending` and move once, to `Completed` or `Cancelled`.

use chrono::{Local, NaiveDateTime};
use log::info;

use super::{CsvMirror, RecordMirror, RecordStore};
use crate::error::{Result, StoreError};
use crate::models::{Claim, ClaimStatus, Fields, Value, TIMESTAMP_FORMAT};

/// Claims with status transitions
pub struct ClaimStore<'a, M: RecordMirror = CsvMirror> {
    records: RecordStore<'a, M>,
}

impl<'a, M: RecordMirror> ClaimStore<'a, M> {
    /// Wrap the claims record store
    pub fn new(records: RecordStore<'a, M>) -> Self {
        ClaimStore { records }
    }

    /// The underlying record store
    pub fn records(&self) -> &RecordStore<'a, M> {
        &self.records
    }

    /// Submit a claim stamped with the current local time
    pub fn submit(&self, food_id: i64, receiver_id: i64) -> Result<i64> {
        self.submit_at(food_id, receiver_id, Local::now().naive_local())
    }

    /// Submit a claim with an explicit timestamp
    pub fn submit_at(&self, food_id: i64, receiver_id: i64, at: NaiveDateTime) -> Result<i64> {
        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        let id = self.records.create(&Claim::fields(food_id, receiver_id, &timestamp))?;
        info!("Claim {} submitted for food {} by receiver {}", id, food_id, receiver_id);
        Ok(id)
    }

    /// A claim by identifier
    pub fn claim(&self, id: i64) -> Result<Claim> {
        let record = self.records.get(id)?.ok_or_else(|| StoreError::NotFound {
            table: self.records.schema().name.clone(),
            id,
        })?;
        Claim::try_from(&record)
    }

    /// Mark a pending claim completed
    pub fn complete(&self, id: i64) -> Result<Claim> {
        self.transition(id, ClaimStatus::Completed)
    }

    /// Cancel a pending claim
    pub fn cancel(&self, id: i64) -> Result<Claim> {
        self.transition(id, ClaimStatus::Cancelled)
    }

    /// Claims still awaiting an outcome, oldest first
    pub fn pending(&self) -> Result<Vec<Claim>> {
        let filter = vec![("Status".to_string(), Value::from(ClaimStatus::Pending.as_str()))];
        let mut claims = self
            .records
            .list(&filter)?
            .iter()
            .map(Claim::try_from)
            .collect::<Result<Vec<_>>>()?;
        claims.sort_by_key(|c| c.id);
        Ok(claims)
    }

    fn transition(&self, id: i64, to: ClaimStatus) -> Result<Claim> {
        let mut claim = self.claim(id)?;
        if !claim.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                table: self.records.schema().name.clone(),
                id,
                from: claim.status.to_string(),
                to: to.to_string(),
            });
        }

        let mut fields = Fields::new();
        fields.insert("Status".to_string(), Value::from(to.as_str()));
        self.records.update(id, &fields)?;

        info!("Claim {} {} -> {}", id, claim.status, to);
        claim.status = to;
        Ok(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::models::{Provider, Receiver};
    use crate::store::Database;
    use chrono::NaiveDate;
    use rstest::rstest;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, Database, i64, i64) {
        let dir = tempdir().unwrap();
        let db = Database::open(StoreConfig::testing(dir.path())).unwrap();
        let provider = db
            .providers()
            .create(&Provider::fields("Acme Foods", "Restaurant", "1 Main St", "Springfield", "555-0100"))
            .unwrap();
        let receiver = db
            .receivers()
            .create(&Receiver::fields("Hope Shelter", "Shelter", "Springfield", "555-0200"))
            .unwrap();
        let food = db
            .food_listings()
            .list_surplus(provider, "Bread", 10, "2025-03-17", "Vegetarian", "Breakfast")
            .unwrap();
        (dir, db, food, receiver)
    }

    #[test]
    fn test_submit_starts_pending() {
        let (_dir, db, food, receiver) = setup();
        let claims = db.claims();
        let at = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap().and_hms_opt(5, 26, 0).unwrap();

        let id = claims.submit_at(food, receiver, at).unwrap();
        let claim = claims.claim(id).unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.timestamp, "2025-03-05 05:26:00");
        assert_eq!(claims.pending().unwrap(), vec![claim]);
    }

    #[test]
    fn test_completed_claim_is_final() {
        let (_dir, db, food, receiver) = setup();
        let claims = db.claims();
        let id = claims.submit(food, receiver).unwrap();

        assert_eq!(claims.complete(id).unwrap().status, ClaimStatus::Completed);
        let err = claims.cancel(id).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { ref from, ref to, .. }
            if from == "Completed" && to == "Cancelled"));

        assert_eq!(claims.claim(id).unwrap().status, ClaimStatus::Completed);
        assert!(claims.pending().unwrap().is_empty());
        let mirrored = claims.records().mirror_rows().unwrap();
        assert_eq!(mirrored[0].text("Status"), Some("Completed"));
    }

    #[rstest]
    #[case("Completed", "Pending")]
    #[case("Cancelled", "Completed")]
    #[case("Cancelled", "Pending")]
    fn test_raw_update_cannot_leave_terminal_status(#[case] first: &str, #[case] then: &str) {
        let (_dir, db, food, receiver) = setup();
        let claims = db.claims();
        let id = claims.submit(food, receiver).unwrap();

        let mut fields = Fields::new();
        fields.insert("Status".to_string(), Value::from(first));
        claims.records().update(id, &fields).unwrap();

        fields.insert("Status".to_string(), Value::from(then));
        assert!(matches!(
            claims.records().update(id, &fields),
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_missing_claim() {
        let (_dir, db, _, _) = setup();
        assert!(matches!(db.claims().complete(42), Err(StoreError::NotFound { id: 42, .. })));
    }
}
