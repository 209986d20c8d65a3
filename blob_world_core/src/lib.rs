use std::fmt;

use serde::{Deserialize, Serialize};

pub mod board;
pub mod config;
pub mod entity;
pub mod error;
pub mod grid;

pub use board::{Action, Board, Observation, StepResult};
pub use config::BoardConfig;
pub use entity::Entity;
pub use error::BoardError;

/// Unique identifier for entities on a board.
pub type EntityId = usize;

/// Represents a 2D coordinate.
///
/// Stored as `f64` because enemies drift by continuous amounts; every other
/// entity stays on integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Grid cell containing this position, or `None` for negative or non-finite coordinates.
    pub fn cell(&self) -> Option<(usize, usize)> {
        if self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0 {
            Some((self.x.floor() as usize, self.y.floor() as usize))
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The part an entity plays on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Player,
    Food,
    Enemy,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Player, Role::Food, Role::Enemy];
}
