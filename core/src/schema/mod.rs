//! Entity schemas
//!
//! This module describes the four entity tables, generates their SQL and
//! validates field sets against them.

mod validator;
mod ddl;

pub use validator::{SchemaValidator, ValidatedFields};
pub use ddl::{create_table_sql, insert_sql, update_sql, select_sql, META_TABLE_SQL};
pub(crate) use ddl::quote;

use crate::models::{ClaimStatus, ColumnDefinition, ColumnType, EntityKind, TableSchema};

/// Provider types offered by the registration form
pub const PROVIDER_TYPES: [&str; 4] = ["Restaurant", "Catering Service", "Grocery Store", "Supermarket"];

/// Receiver types offered by the registration form
pub const RECEIVER_TYPES: [&str; 4] = ["Individual", "Charity", "NGO", "Shelter"];

/// Food types offered by the listing form
pub const FOOD_TYPES: [&str; 3] = ["Vegetarian", "Non-Vegetarian", "Vegan"];

/// Meal types offered by the listing form
pub const MEAL_TYPES: [&str; 4] = ["Breakfast", "Lunch", "Dinner", "Snacks"];

/// Schema of an entity table
pub fn table_schema(kind: EntityKind) -> TableSchema {
    match kind {
        EntityKind::Provider => TableSchema::new(
            kind.table_name(),
            kind.id_column(),
            vec![
                ColumnDefinition::new("Name", ColumnType::Text).required(),
                ColumnDefinition::new("Type", ColumnType::Text).required().one_of(&PROVIDER_TYPES),
                ColumnDefinition::new("Address", ColumnType::Text).required(),
                ColumnDefinition::new("City", ColumnType::Text).required(),
                ColumnDefinition::new("Contact", ColumnType::Text).required().unique(),
            ],
        ),
        EntityKind::Receiver => TableSchema::new(
            kind.table_name(),
            kind.id_column(),
            vec![
                ColumnDefinition::new("Name", ColumnType::Text).required(),
                ColumnDefinition::new("Type", ColumnType::Text).required().one_of(&RECEIVER_TYPES),
                ColumnDefinition::new("City", ColumnType::Text).required(),
                ColumnDefinition::new("Contact", ColumnType::Text).required().unique(),
            ],
        ),
        EntityKind::FoodListing => TableSchema::new(
            kind.table_name(),
            kind.id_column(),
            vec![
                ColumnDefinition::new("Food_Name", ColumnType::Text).required(),
                ColumnDefinition::new("Quantity", ColumnType::Integer).required().min(1),
                ColumnDefinition::new("Expiry_Date", ColumnType::Date).required(),
                ColumnDefinition::new("Provider_ID", ColumnType::Integer)
                    .required()
                    .references(EntityKind::Provider.table_name(), EntityKind::Provider.id_column()),
                ColumnDefinition::new("Provider_Type", ColumnType::Text)
                    .required()
                    .one_of(&PROVIDER_TYPES),
                ColumnDefinition::new("Location", ColumnType::Text).required(),
                ColumnDefinition::new("Food_Type", ColumnType::Text).required().one_of(&FOOD_TYPES),
                ColumnDefinition::new("Meal_Type", ColumnType::Text).required().one_of(&MEAL_TYPES),
            ],
        ),
        EntityKind::Claim => TableSchema::new(
            kind.table_name(),
            kind.id_column(),
            vec![
                ColumnDefinition::new("Food_ID", ColumnType::Integer)
                    .required()
                    .references(EntityKind::FoodListing.table_name(), EntityKind::FoodListing.id_column()),
                ColumnDefinition::new("Receiver_ID", ColumnType::Integer)
                    .required()
                    .references(EntityKind::Receiver.table_name(), EntityKind::Receiver.id_column()),
                ColumnDefinition::new("Status", ColumnType::Text)
                    .required()
                    .one_of(&ClaimStatus::ALL.map(|s| s.as_str())),
                ColumnDefinition::new("Timestamp", ColumnType::Timestamp).required(),
            ],
        )
        .with_status_rule(ClaimStatus::status_rule("Status")),
    }
}

/// Schemas of all entity tables, parents first
pub fn all_schemas() -> Vec<TableSchema> {
    EntityKind::ALL.iter().map(|kind| table_schema(*kind)).collect()
}
