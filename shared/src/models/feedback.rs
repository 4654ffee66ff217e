//! Customer feedback models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rating and comment left by a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub order_id: Option<Uuid>,
    pub rating: i16,
    pub comment: String,
    /// Hidden entries are only shown in the back office
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

/// Rating summary for a product page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    pub count: usize,
    pub average: Option<f64>,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: f64 = ratings.iter().map(|r| f64::from(*r)).sum();
        let average = sum / ratings.len() as f64;
        Self {
            count: ratings.len(),
            average: Some((average * 10.0).round() / 10.0),
        }
    }
}

/// Feedback form; a product or an order must be referenced
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
#[validate(schema(function = "crate::validation::validate_feedback_target"))]
pub struct CreateFeedbackInput {
    pub product_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackVisibilityInput {
    pub is_visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_rating_summary() {
        let summary = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(4.3));
        assert_eq!(RatingSummary::from_ratings(&[]).average, None);
    }

    #[test]
    fn test_feedback_requires_target() {
        let input = CreateFeedbackInput {
            product_id: None,
            order_id: None,
            rating: 4,
            comment: String::new(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_feedback_rating_range() {
        let mut input = CreateFeedbackInput {
            product_id: Some(Uuid::new_v4()),
            order_id: None,
            rating: 5,
            comment: "great".to_string(),
        };
        assert!(input.validate().is_ok());
        input.rating = 6;
        assert!(input.validate().is_err());
        input.rating = 0;
        assert!(input.validate().is_err());
    }
}
