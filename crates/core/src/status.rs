use serde::Serialize;

use crate::record::Classification;

/// Sign of a stock figure. `Negative` is an alert state for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Negative,
    Empty,
    Available,
}

impl StockLevel {
    pub fn of(stock: i64) -> Self {
        match stock {
            s if s < 0 => Self::Negative,
            0 => Self::Empty,
            _ => Self::Available,
        }
    }
}

/// Movement status derived from classification and stock.
///
/// `LowMovement` (C) and `Stagnant` ("Sin Mov" still holding stock) are the
/// two call-out states; "Sin Mov" with nothing on hand is `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Active,
    LowMovement,
    Stagnant,
    Neutral,
}

impl MovementStatus {
    pub fn of(classification: &Classification, stock: i64) -> Self {
        match classification {
            Classification::C => Self::LowMovement,
            Classification::NoMovement if stock > 0 => Self::Stagnant,
            Classification::NoMovement => Self::Neutral,
            Classification::A | Classification::B | Classification::Other(_) => Self::Active,
        }
    }
}

impl std::fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::LowMovement => write!(f, "low_movement"),
            Self::Stagnant => write!(f, "stagnant"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}
