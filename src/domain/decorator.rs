use super::record::RecordId;
use super::user::AccountStatus;
use crate::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Weekday {
    Saturday,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

/// A service-provider profile, linked to its user by email.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Decorator {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Email of the owning user.
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub availability: Vec<Weekday>,
    #[serde(default)]
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Decorator {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Administrative patch over a decorator profile.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoratorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<Weekday>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

impl DecoratorPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        if self.is_empty() {
            return Err(MarketError::InvalidArgument(
                "decorator update carries no fields".to_string(),
            ));
        }
        if let Some(rating) = self.rating
            && !(0.0..=5.0).contains(&rating)
        {
            return Err(MarketError::InvalidArgument(format!(
                "rating must be within 0..=5, got {rating}"
            )));
        }
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(MarketError::InvalidArgument(
                "decorator name must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_validation() {
        assert!(matches!(
            DecoratorPatch::default().validate(),
            Err(MarketError::InvalidArgument(_))
        ));

        let bad_rating = DecoratorPatch {
            rating: Some(7.5),
            ..Default::default()
        };
        assert!(bad_rating.validate().is_err());

        let ok = DecoratorPatch {
            availability: Some(vec![Weekday::Saturday, Weekday::Sunday]),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_patch_serializes_only_supplied_fields() {
        let patch = DecoratorPatch {
            specialty: Some("Stage & Venue Setup".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        assert_eq!(value["specialty"], "Stage & Venue Setup");
    }
}
