//! Stock movement ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::MAX_STOCK_QUANTITY;

/// Kind of stock change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Entry,
    Adjustment,
    Exit,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "entry",
            MovementType::Adjustment => "adjustment",
            MovementType::Exit => "exit",
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(MovementType::Entry),
            "adjustment" => Ok(MovementType::Adjustment),
            "exit" => Ok(MovementType::Exit),
            other => Err(format!("unknown movement type '{}'", other)),
        }
    }
}

impl TryFrom<String> for MovementType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit row for a stock quantity change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub movement_type: MovementType,
    /// Signed change applied to the product quantity
    pub quantity_change: i32,
    /// Product quantity after the change
    pub resulting_balance: i32,
    pub note: String,
    pub order_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A movement computed before it is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMovement {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity_change: i32,
    pub resulting_balance: i32,
    pub note: String,
}

/// Staff-entered stock change request
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct ManualMovementInput {
    pub movement_type: MovementType,
    /// Units received/removed, or the counted quantity for an adjustment
    #[validate(range(min = 0, max = 1000000))]
    pub quantity: i32,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MovementError {
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("counted quantity cannot be negative")]
    NegativeCount,
    #[error("only {available} units in stock, cannot remove {requested}")]
    Insufficient { available: i32, requested: i32 },
    #[error("adjustment does not change the quantity")]
    NoChange,
    #[error("stock cannot exceed {max} units")]
    StockLimitExceeded { max: i32 },
}

/// Compute the ledger row for a manual stock change against `current`.
pub fn plan_manual_movement(
    product_id: Uuid,
    current: i32,
    input: &ManualMovementInput,
) -> Result<PlannedMovement, MovementError> {
    let (change, default_note) = match input.movement_type {
        MovementType::Entry => {
            if input.quantity <= 0 {
                return Err(MovementError::NonPositiveQuantity);
            }
            (input.quantity, "Stock entry".to_string())
        }
        MovementType::Exit => {
            if input.quantity <= 0 {
                return Err(MovementError::NonPositiveQuantity);
            }
            if input.quantity > current {
                return Err(MovementError::Insufficient {
                    available: current,
                    requested: input.quantity,
                });
            }
            (-input.quantity, "Stock exit".to_string())
        }
        MovementType::Adjustment => {
            if input.quantity < 0 {
                return Err(MovementError::NegativeCount);
            }
            if input.quantity == current {
                return Err(MovementError::NoChange);
            }
            (
                input.quantity - current,
                format!("Adjusted from {} to {}", current, input.quantity),
            )
        }
    };

    let resulting_balance = current
        .checked_add(change)
        .filter(|q| *q <= MAX_STOCK_QUANTITY)
        .ok_or(MovementError::StockLimitExceeded {
            max: MAX_STOCK_QUANTITY,
        })?;

    let note = input
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or(default_note);

    Ok(PlannedMovement {
        product_id,
        movement_type: input.movement_type,
        quantity_change: change,
        resulting_balance,
        note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(movement_type: MovementType, quantity: i32) -> ManualMovementInput {
        ManualMovementInput {
            movement_type,
            quantity,
            note: None,
        }
    }

    #[test]
    fn test_entry_adds_stock() {
        let m = plan_manual_movement(Uuid::nil(), 5, &input(MovementType::Entry, 3)).unwrap();
        assert_eq!(m.quantity_change, 3);
        assert_eq!(m.resulting_balance, 8);
        assert_eq!(m.note, "Stock entry");
    }

    #[test]
    fn test_entry_beyond_stock_limit_is_rejected() {
        let err = plan_manual_movement(
            Uuid::nil(),
            MAX_STOCK_QUANTITY,
            &input(MovementType::Entry, 1),
        )
        .unwrap_err();
        assert_eq!(
            err,
            MovementError::StockLimitExceeded {
                max: MAX_STOCK_QUANTITY
            }
        );
        let err = plan_manual_movement(Uuid::nil(), 10, &input(MovementType::Entry, i32::MAX))
            .unwrap_err();
        assert!(matches!(err, MovementError::StockLimitExceeded { .. }));
    }

    #[test]
    fn test_input_quantity_range() {
        use validator::Validate;
        assert!(input(MovementType::Entry, 1_000_000).validate().is_ok());
        assert!(input(MovementType::Entry, 1_000_001).validate().is_err());
        assert!(input(MovementType::Exit, -1).validate().is_err());
    }

    #[test]
    fn test_exit_rejects_overdraw() {
        let err = plan_manual_movement(Uuid::nil(), 2, &input(MovementType::Exit, 3)).unwrap_err();
        assert_eq!(
            err,
            MovementError::Insufficient {
                available: 2,
                requested: 3
            }
        );
    }

    #[test]
    fn test_adjustment_sets_absolute_count() {
        let m =
            plan_manual_movement(Uuid::nil(), 10, &input(MovementType::Adjustment, 4)).unwrap();
        assert_eq!(m.quantity_change, -6);
        assert_eq!(m.resulting_balance, 4);
        assert_eq!(m.note, "Adjusted from 10 to 4");
    }

    #[test]
    fn test_adjustment_without_change_rejected() {
        let err =
            plan_manual_movement(Uuid::nil(), 4, &input(MovementType::Adjustment, 4)).unwrap_err();
        assert_eq!(err, MovementError::NoChange);
    }

    #[test]
    fn test_custom_note_kept() {
        let mut i = input(MovementType::Entry, 1);
        i.note = Some("  supplier delivery ".to_string());
        let m = plan_manual_movement(Uuid::nil(), 0, &i).unwrap();
        assert_eq!(m.note, "supplier delivery");
    }

    #[test]
    fn test_movement_type_parse() {
        assert_eq!("exit".parse::<MovementType>(), Ok(MovementType::Exit));
        assert!("sale".parse::<MovementType>().is_err());
    }
}
