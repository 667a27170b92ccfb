use super::record::RecordId;
use crate::error::MarketError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog item clients can book.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(rename = "service_name")]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default, rename = "service_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, rename = "createdByEmail")]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an administrator supplies when adding a catalog item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    #[serde(rename = "service_name")]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default, rename = "service_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl NewService {
    pub fn into_service(
        self,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Service, MarketError> {
        if self.name.trim().is_empty() {
            return Err(MarketError::InvalidArgument(
                "service name must not be blank".to_string(),
            ));
        }
        if self.cost.is_sign_negative() {
            return Err(MarketError::InvalidArgument(format!(
                "service cost must be non-negative, got {}",
                self.cost
            )));
        }
        Ok(Service {
            id: RecordId::new(),
            name: self.name,
            cost: self.cost,
            unit: self.unit,
            category: self.category,
            description: self.description,
            image: self.image,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_service(cost: Decimal) -> NewService {
        NewService {
            name: "Classic Wedding Stage".into(),
            cost,
            unit: "per event".into(),
            category: "wedding".into(),
            description: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn test_negative_cost_rejected() {
        let result = new_service(dec!(-1)).into_service("rabbi@live.com", Utc::now());
        assert!(matches!(result, Err(MarketError::InvalidArgument(_))));
    }

    #[test]
    fn test_free_service_allowed() {
        let service = new_service(dec!(0))
            .into_service("rabbi@live.com", Utc::now())
            .unwrap();
        assert_eq!(service.cost, dec!(0));
        assert_eq!(service.created_by, "rabbi@live.com");
    }

    #[test]
    fn test_document_uses_catalog_field_names() {
        let service = new_service(dec!(50000))
            .into_service("rabbi@live.com", Utc::now())
            .unwrap();
        let value = serde_json::to_value(&service).unwrap();
        assert_eq!(value["service_name"], "Classic Wedding Stage");
        assert_eq!(value["service_category"], "wedding");
        assert_eq!(value["cost"].as_f64(), Some(50000.0));
    }
}
