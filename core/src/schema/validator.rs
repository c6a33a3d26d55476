//! Field validation
//!
//! Every write is checked here before either the table or the mirror is
//! touched.

use crate::error::{Result, StoreError};
use crate::models::{Fields, Filter, TableSchema, Value};

/// Validated (column, value) pairs in schema order
pub type ValidatedFields = Vec<(String, Value)>;

/// Validates field sets against a table schema
#[derive(Debug, Clone)]
pub struct SchemaValidator;

impl SchemaValidator {
    fn reject_unknown(schema: &TableSchema, names: impl Iterator<Item = impl AsRef<str>>) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            if !schema.has_column(name) {
                return Err(StoreError::Validation(format!(
                    "{} has no column {:?}",
                    schema.name, name
                )));
            }
        }
        Ok(())
    }

    /// Validate the fields of a new record.
    ///
    /// Returns every data column in schema order; absent optional columns are
    /// `Null` and an absent status column gets the rule's initial status.
    pub fn validate_create(schema: &TableSchema, fields: &Fields) -> Result<ValidatedFields> {
        Self::reject_unknown(schema, fields.keys())?;

        if fields.contains_key(&schema.id_column) {
            return Err(StoreError::Validation(format!(
                "{} is assigned by the store",
                schema.id_column
            )));
        }

        let mut validated = Vec::with_capacity(schema.columns.len());
        for column in &schema.columns {
            let mut value = fields.get(&column.name).cloned().unwrap_or(Value::Null);

            if let Some(rule) = schema.status_rule.as_ref().filter(|r| r.column == column.name) {
                if value.is_blank() {
                    value = Value::Text(rule.initial.clone());
                } else if value.to_string().trim() != rule.initial {
                    return Err(StoreError::Validation(format!(
                        "new {} rows must start as {}, got {}",
                        schema.name, rule.initial, value
                    )));
                }
            }

            if column.required && value.is_blank() {
                return Err(StoreError::Validation(format!("{} is required", column.name)));
            }
            validated.push((column.name.clone(), column.check(&value)?));
        }

        Ok(validated)
    }

    /// Validate the fields of an update. Only the given columns are returned.
    pub fn validate_update(schema: &TableSchema, fields: &Fields) -> Result<ValidatedFields> {
        if fields.is_empty() {
            return Err(StoreError::Validation("no fields to update".to_string()));
        }
        Self::reject_unknown(schema, fields.keys())?;

        if fields.contains_key(&schema.id_column) {
            return Err(StoreError::Validation(format!(
                "{} cannot be changed",
                schema.id_column
            )));
        }

        let mut validated = Vec::with_capacity(fields.len());
        for column in &schema.columns {
            if let Some(value) = fields.get(&column.name) {
                if column.required && value.is_blank() {
                    return Err(StoreError::Validation(format!(
                        "{} cannot be empty",
                        column.name
                    )));
                }
                validated.push((column.name.clone(), column.check(value)?));
            }
        }

        Ok(validated)
    }

    /// Validate that every filter column exists
    pub fn validate_filter(schema: &TableSchema, filter: &Filter) -> Result<()> {
        Self::reject_unknown(schema, filter.iter().map(|(name, _)| name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Claim, EntityKind, Provider};
    use crate::schema::table_schema;

    fn provider_fields() -> Fields {
        Provider::fields("Acme Foods", "Restaurant", "1 Main St", "Springfield", "555-0100")
    }

    #[test]
    fn test_create_orders_columns() {
        let schema = table_schema(EntityKind::Provider);
        let validated = SchemaValidator::validate_create(&schema, &provider_fields()).unwrap();

        let names: Vec<_> = validated.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Name", "Type", "Address", "City", "Contact"]);
    }

    #[test]
    fn test_create_requires_fields() {
        let schema = table_schema(EntityKind::Provider);

        let mut fields = provider_fields();
        fields.insert("City".to_string(), Value::from("  "));
        let err = SchemaValidator::validate_create(&schema, &fields).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: City is required");

        let mut fields = provider_fields();
        fields.remove("Contact");
        assert!(SchemaValidator::validate_create(&schema, &fields).is_err());
    }

    #[test]
    fn test_create_rejects_unknown_and_id() {
        let schema = table_schema(EntityKind::Provider);

        let mut fields = provider_fields();
        fields.insert("Country".to_string(), Value::from("US"));
        assert!(SchemaValidator::validate_create(&schema, &fields).is_err());

        let mut fields = provider_fields();
        fields.insert("Provider_ID".to_string(), Value::Integer(9));
        assert!(SchemaValidator::validate_create(&schema, &fields).is_err());
    }

    #[test]
    fn test_create_fills_initial_status() {
        let schema = table_schema(EntityKind::Claim);
        let fields = Claim::fields(1, 1, "2025-03-05 05:26:00");

        let validated = SchemaValidator::validate_create(&schema, &fields).unwrap();
        let status = validated.iter().find(|(n, _)| n == "Status").map(|(_, v)| v.clone());
        assert_eq!(status, Some(Value::from("Pending")));

        let mut fields = Claim::fields(1, 1, "2025-03-05 05:26:00");
        fields.insert("Status".to_string(), Value::from("Completed"));
        assert!(SchemaValidator::validate_create(&schema, &fields).is_err());
    }

    #[test]
    fn test_update_checks_only_given_fields() {
        let schema = table_schema(EntityKind::Provider);

        let mut fields = Fields::new();
        fields.insert("City".to_string(), Value::from("Shelbyville"));
        let validated = SchemaValidator::validate_update(&schema, &fields).unwrap();
        assert_eq!(validated, vec![("City".to_string(), Value::from("Shelbyville"))]);

        fields.insert("Name".to_string(), Value::from(""));
        assert!(SchemaValidator::validate_update(&schema, &fields).is_err());

        assert!(SchemaValidator::validate_update(&schema, &Fields::new()).is_err());

        let mut fields = Fields::new();
        fields.insert("Provider_ID".to_string(), Value::Integer(2));
        assert!(SchemaValidator::validate_update(&schema, &fields).is_err());
    }

    #[test]
    fn test_values_are_stored_trimmed() {
        let schema = table_schema(EntityKind::FoodListing);
        let mut fields = Fields::new();
        fields.insert("Expiry_Date".to_string(), Value::from(" 2025-03-17"));
        fields.insert("Meal_Type".to_string(), Value::from("Lunch "));

        let validated = SchemaValidator::validate_update(&schema, &fields).unwrap();
        assert!(validated.contains(&("Expiry_Date".to_string(), Value::from("2025-03-17"))));
        assert!(validated.contains(&("Meal_Type".to_string(), Value::from("Lunch"))));

        let schema = table_schema(EntityKind::Provider);
        let mut fields = provider_fields();
        fields.insert("Contact".to_string(), Value::from("555-0100 "));
        let validated = SchemaValidator::validate_create(&schema, &fields).unwrap();
        assert_eq!(validated[4], ("Contact".to_string(), Value::from("555-0100")));
    }

    #[test]
    fn test_filter_columns() {
        let schema = table_schema(EntityKind::Receiver);
        assert!(SchemaValidator::validate_filter(&schema, &vec![("City".to_string(), Value::from("X"))]).is_ok());
        assert!(SchemaValidator::validate_filter(&schema, &vec![("Town".to_string(), Value::from("X"))]).is_err());
    }
}
