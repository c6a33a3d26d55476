//! Food listing helpers

use super::{CsvMirror, RecordMirror, RecordStore};
use crate::error::{Result, StoreError};
use crate::models::{FoodListing, Provider};

/// Food listings, with provider details filled in from the providers table
pub struct FoodListingStore<'a, M: RecordMirror = CsvMirror, P: RecordMirror = CsvMirror> {
    records: RecordStore<'a, M>,
    providers: RecordStore<'a, P>,
}

impl<'a, M: RecordMirror, P: RecordMirror> FoodListingStore<'a, M, P> {
    /// Create the helper from the listings and providers stores
    pub fn new(records: RecordStore<'a, M>, providers: RecordStore<'a, P>) -> Self {
        FoodListingStore { records, providers }
    }

    /// The underlying listings store
    pub fn records(&self) -> &RecordStore<'a, M> {
        &self.records
    }

    /// List surplus food on behalf of a provider.
    ///
    /// `Provider_Type` and `Location` are copied from the provider's `Type` and `City`.
    pub fn list_surplus(
        &self,
        provider_id: i64,
        food_name: &str,
        quantity: i64,
        expiry_date: &str,
        food_type: &str,
        meal_type: &str,
    ) -> Result<i64> {
        let record = self.providers.get(provider_id)?.ok_or_else(|| StoreError::ForeignKey {
            table: self.records.schema().name.clone(),
            column: "Provider_ID".to_string(),
            value: provider_id.to_string(),
        })?;
        let provider = Provider::try_from(&record)?;

        let fields = FoodListing::fields(
            food_name,
            quantity,
            expiry_date,
            provider.id,
            &provider.provider_type,
            &provider.city,
            food_type,
            meal_type,
        );
        self.records.create(&fields)
    }

    /// A listing by identifier
    pub fn listing(&self, id: i64) -> Result<FoodListing> {
        let record = self.records.get(id)?.ok_or_else(|| StoreError::NotFound {
            table: self.records.schema().name.clone(),
            id,
        })?;
        FoodListing::try_from(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::store::Database;
    use tempfile::tempdir;

    #[test]
    fn test_list_surplus_copies_provider_details() {
        let dir = tempdir().unwrap();
        let db = Database::open(StoreConfig::testing(dir.path())).unwrap();
        let provider = db
            .providers()
            .create(&Provider::fields("Acme Foods", "Catering Service", "1 Main St", "Springfield", "555-0100"))
            .unwrap();

        let listings = db.food_listings();
        let id = listings
            .list_surplus(provider, "Rice", 25, "2025-03-20", "Vegan", "Lunch")
            .unwrap();

        let listing = listings.listing(id).unwrap();
        assert_eq!(listing.provider_type, "Catering Service");
        assert_eq!(listing.location, "Springfield");
        assert_eq!(listing.quantity, 25);
        assert_eq!(listings.records().mirror_rows().unwrap().len(), 1);
    }

    #[test]
    fn test_list_surplus_rejects_unknown_provider() {
        let dir = tempdir().unwrap();
        let db = Database::open(StoreConfig::testing(dir.path())).unwrap();

        let err = db
            .food_listings()
            .list_surplus(7, "Rice", 25, "2025-03-20", "Vegan", "Lunch")
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey { .. }));
        assert!(matches!(db.food_listings().listing(1), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_list_surplus_validates_quantity() {
        let dir = tempdir().unwrap();
        let db = Database::open(StoreConfig::testing(dir.path())).unwrap();
        let provider = db
            .providers()
            .create(&Provider::fields("Acme Foods", "Restaurant", "1 Main St", "Springfield", "555-0100"))
            .unwrap();

        let err = db
            .food_listings()
            .list_surplus(provider, "Rice", 0, "2025-03-20", "Vegan", "Lunch")
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
