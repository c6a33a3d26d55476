//! The four entities and their typed views
//!
//! Stores work on untyped [`Record`]s; the structs here are convenience views
//! for callers that know which entity they hold.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::error::{Result, StoreError};
use super::claim::ClaimStatus;
use super::row::{Fields, Record, Value};

/// Entity managed by a record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Food provider (restaurant, grocery store, ...)
    Provider,

    /// Food receiver (NGO, shelter, individual, ...)
    Receiver,

    /// Surplus food listed by a provider
    FoodListing,

    /// A receiver's claim on a listing
    Claim,
}

impl EntityKind {
    /// All entities, parents before children
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Provider,
        EntityKind::Receiver,
        EntityKind::FoodListing,
        EntityKind::Claim,
    ];

    /// Table name
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Provider => "providers",
            EntityKind::Receiver => "receivers",
            EntityKind::FoodListing => "food_listings",
            EntityKind::Claim => "claims",
        }
    }

    /// Identifier column
    pub fn id_column(&self) -> &'static str {
        match self {
            EntityKind::Provider => "Provider_ID",
            EntityKind::Receiver => "Receiver_ID",
            EntityKind::FoodListing => "Food_ID",
            EntityKind::Claim => "Claim_ID",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.table_name())
    }
}

impl FromStr for EntityKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provider" | "providers" => Ok(EntityKind::Provider),
            "receiver" | "receivers" => Ok(EntityKind::Receiver),
            "food" | "food_listing" | "food_listings" | "listing" | "listings" => {
                Ok(EntityKind::FoodListing)
            }
            "claim" | "claims" => Ok(EntityKind::Claim),
            other => Err(StoreError::Validation(format!("unknown entity {:?}", other))),
        }
    }
}

fn text_field(record: &Record, column: &str) -> Result<String> {
    match record.get(column) {
        Some(Value::Null) => Ok(String::new()),
        Some(value) => Ok(value.to_string()),
        None => Err(StoreError::Validation(format!(
            "{} record has no {} column",
            record.table, column
        ))),
    }
}

fn integer_field(record: &Record, column: &str) -> Result<i64> {
    record.integer(column).ok_or_else(|| {
        StoreError::Validation(format!("{} record has no integer {}", record.table, column))
    })
}

fn fields_of(pairs: Vec<(&str, Value)>) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// A food provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Identifier assigned by the store
    #[serde(rename = "Provider_ID")]
    pub id: i64,
    /// Business name
    #[serde(rename = "Name")]
    pub name: String,
    /// Kind of business, e.g. `Restaurant`
    #[serde(rename = "Type")]
    pub provider_type: String,
    /// Street address
    #[serde(rename = "Address")]
    pub address: String,
    /// City
    #[serde(rename = "City")]
    pub city: String,
    /// Contact detail, unique among providers
    #[serde(rename = "Contact")]
    pub contact: String,
}

impl Provider {
    /// Fields for registering a provider
    pub fn fields(name: &str, provider_type: &str, address: &str, city: &str, contact: &str) -> Fields {
        fields_of(vec![
            ("Name", Value::from(name)),
            ("Type", Value::from(provider_type)),
            ("Address", Value::from(address)),
            ("City", Value::from(city)),
            ("Contact", Value::from(contact)),
        ])
    }
}

impl TryFrom<&Record> for Provider {
    type Error = StoreError;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Provider {
            id: record.id,
            name: text_field(record, "Name")?,
            provider_type: text_field(record, "Type")?,
            address: text_field(record, "Address")?,
            city: text_field(record, "City")?,
            contact: text_field(record, "Contact")?,
        })
    }
}

/// A food receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Identifier assigned by the store
    #[serde(rename = "Receiver_ID")]
    pub id: i64,
    /// Name of the person or organisation
    #[serde(rename = "Name")]
    pub name: String,
    /// Kind of receiver, e.g. `Shelter`
    #[serde(rename = "Type")]
    pub receiver_type: String,
    /// City
    #[serde(rename = "City")]
    pub city: String,
    /// Contact detail, unique among receivers
    #[serde(rename = "Contact")]
    pub contact: String,
}

impl Receiver {
    /// Fields for registering a receiver
    pub fn fields(name: &str, receiver_type: &str, city: &str, contact: &str) -> Fields {
        fields_of(vec![
            ("Name", Value::from(name)),
            ("Type", Value::from(receiver_type)),
            ("City", Value::from(city)),
            ("Contact", Value::from(contact)),
        ])
    }
}

impl TryFrom<&Record> for Receiver {
    type Error = StoreError;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Receiver {
            id: record.id,
            name: text_field(record, "Name")?,
            receiver_type: text_field(record, "Type")?,
            city: text_field(record, "City")?,
            contact: text_field(record, "Contact")?,
        })
    }
}

/// A surplus food listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodListing {
    /// Identifier assigned by the store
    #[serde(rename = "Food_ID")]
    pub id: i64,
    /// What is on offer
    #[serde(rename = "Food_Name")]
    pub food_name: String,
    /// Units available, at least one
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    /// `YYYY-MM-DD` expiry date
    #[serde(rename = "Expiry_Date")]
    pub expiry_date: String,
    /// Listing provider
    #[serde(rename = "Provider_ID")]
    pub provider_id: i64,
    /// Provider's type at listing time
    #[serde(rename = "Provider_Type")]
    pub provider_type: String,
    /// Pickup city
    #[serde(rename = "Location")]
    pub location: String,
    /// `Vegetarian`, `Non-Vegetarian` or `Vegan`
    #[serde(rename = "Food_Type")]
    pub food_type: String,
    /// Meal the food suits
    #[serde(rename = "Meal_Type")]
    pub meal_type: String,
}

impl FoodListing {
    /// Fields for listing surplus food
    #[allow(clippy::too_many_arguments)]
    pub fn fields(
        food_name: &str,
        quantity: i64,
        expiry_date: &str,
        provider_id: i64,
        provider_type: &str,
        location: &str,
        food_type: &str,
        meal_type: &str,
    ) -> Fields {
        fields_of(vec![
            ("Food_Name", Value::from(food_name)),
            ("Quantity", Value::Integer(quantity)),
            ("Expiry_Date", Value::from(expiry_date)),
            ("Provider_ID", Value::Integer(provider_id)),
            ("Provider_Type", Value::from(provider_type)),
            ("Location", Value::from(location)),
            ("Food_Type", Value::from(food_type)),
            ("Meal_Type", Value::from(meal_type)),
        ])
    }
}

impl TryFrom<&Record> for FoodListing {
    type Error = StoreError;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(FoodListing {
            id: record.id,
            food_name: text_field(record, "Food_Name")?,
            quantity: integer_field(record, "Quantity")?,
            expiry_date: text_field(record, "Expiry_Date")?,
            provider_id: integer_field(record, "Provider_ID")?,
            provider_type: text_field(record, "Provider_Type")?,
            location: text_field(record, "Location")?,
            food_type: text_field(record, "Food_Type")?,
            meal_type: text_field(record, "Meal_Type")?,
        })
    }
}

/// A receiver's claim on a food listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Identifier assigned by the store
    #[serde(rename = "Claim_ID")]
    pub id: i64,
    /// Claimed listing
    #[serde(rename = "Food_ID")]
    pub food_id: i64,
    /// Claiming receiver
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: i64,
    /// Lifecycle status
    #[serde(rename = "Status")]
    pub status: ClaimStatus,
    /// When the claim was made, `YYYY-MM-DD HH:MM:SS`
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

impl Claim {
    /// Fields for a new claim; status is filled in by the store
    pub fn fields(food_id: i64, receiver_id: i64, timestamp: &str) -> Fields {
        fields_of(vec![
            ("Food_ID", Value::Integer(food_id)),
            ("Receiver_ID", Value::Integer(receiver_id)),
            ("Timestamp", Value::from(timestamp)),
        ])
    }
}

impl TryFrom<&Record> for Claim {
    type Error = StoreError;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Claim {
            id: record.id,
            food_id: integer_field(record, "Food_ID")?,
            receiver_id: integer_field(record, "Receiver_ID")?,
            status: text_field(record, "Status")?.parse()?,
            timestamp: text_field(record, "Timestamp")?,
        })
    }
}
