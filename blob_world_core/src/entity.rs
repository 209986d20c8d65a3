use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{EntityId, Position, Role};

/// A single blob on the board.
///
/// Entities only move through [`Entity::apply_action`] and [`Entity::move_by`],
/// both of which keep the position inside `[0, bound]` on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    role: Role,
    label: Option<String>,
    position: Position,
    bound: f64,
}

impl Entity {
    /// Creates an entity at a uniformly random integer cell in `[0, board_size)`.
    pub fn spawn<R: Rng + ?Sized>(
        id: EntityId,
        role: Role,
        label: Option<String>,
        board_size: usize,
        rng: &mut R,
    ) -> Self {
        let x = rng.random_range(0..board_size);
        let y = rng.random_range(0..board_size);
        Self::at(id, role, label, board_size, Position::new(x as f64, y as f64))
    }

    /// Creates an entity at a fixed position, clamped onto the board.
    pub fn at(
        id: EntityId,
        role: Role,
        label: Option<String>,
        board_size: usize,
        position: Position,
    ) -> Self {
        let bound = board_size as f64;
        Self {
            id,
            role,
            label,
            position: Position::new(position.x.clamp(0.0, bound), position.y.clamp(0.0, bound)),
            bound,
        }
    }

    /// Board-unique id assigned at creation.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Role this entity plays.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Display name, if the entity has one.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Current coordinates.
    pub fn position(&self) -> Position {
        self.position
    }

    /// This entity's coordinates minus `other`'s.
    pub fn position_delta(&self, other: &Entity) -> (f64, f64) {
        (
            self.position.x - other.position.x,
            self.position.y - other.position.y,
        )
    }

    /// Nudges the entity by at most one unit per axis.
    ///
    /// Each component is clamped into `[-1, 1]` independently, so `(5, -7)`
    /// moves exactly like `(1, -1)`.
    pub fn apply_action(&mut self, dx: f64, dy: f64) {
        self.move_by(dx.clamp(-1.0, 1.0), dy.clamp(-1.0, 1.0));
    }

    /// Moves by `(dx, dy)` and clamps the result onto the board.
    ///
    /// A zero component leaves that axis untouched.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        if dx != 0.0 {
            self.position.x += dx;
        }
        if dy != 0.0 {
            self.position.y += dy;
        }
        self.position.x = self.position.x.clamp(0.0, self.bound);
        self.position.y = self.position.y.clamp(0.0, self.bound);
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, position: Position) {
        self.position = Position::new(
            position.x.clamp(0.0, self.bound),
            position.y.clamp(0.0, self.bound),
        );
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}: {}", label, self.position),
            None => write!(f, "Blob: {}", self.position),
        }
    }
}
