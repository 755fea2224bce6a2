use serde::{Deserialize, Serialize};

/// Direction of the single open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

/// Position tracking
///
/// `quantity` is signed: positive for long, negative for short. Stop and
/// target only exist while the position is open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub quantity: i64,
    pub entry_price: Option<f64>,
    pub stop: Option<f64>,
    pub target: Option<f64>,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn long(quantity: i64, entry_price: f64, stop: f64, target: f64) -> Self {
        Self {
            side: PositionSide::Long,
            quantity: quantity.abs(),
            entry_price: Some(entry_price),
            stop: Some(stop),
            target: Some(target),
        }
    }

    pub fn short(quantity: i64, entry_price: f64, stop: f64, target: f64) -> Self {
        Self {
            side: PositionSide::Short,
            quantity: -quantity.abs(),
            entry_price: Some(entry_price),
            stop: Some(stop),
            target: Some(target),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        match self.entry_price {
            Some(entry) => self.quantity as f64 * (current_price - entry),
            None => 0.0,
        }
    }
}
