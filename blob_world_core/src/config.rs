//! Board configuration.
//!
//! The scoring constants and the turn cap are fixed; only the population,
//! board size, naming and seed change between runs.

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Default width and height of the board.
pub const BOARD_SIZE: usize = 10;

/// Score lost by every player move, including waiting.
pub const MOVE_PENALTY: i64 = 1;

/// Score lost when an enemy catches a player.
pub const ENEMY_PENALTY: i64 = 300;

/// Score gained when a player reaches food.
pub const FOOD_REWARD: i64 = 25;

/// Number of turns after which an episode ends regardless of survivors.
pub const TURN_CAP: u32 = 200;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 1;

/// Player names handed out when naming is enabled.
pub const DEFAULT_NAMES: &[&str] = &[
    "Todd", "Chad", "Ross", "Chase", "Colin", "Greg", "Phillip", "Kurt", "Connor", "Jack", "John",
    "Ian", "Spencer", "Martin", "Adam", "Rob", "Cam", "Cameron", "Josh", "Jeremy", "Aaron", "Chaz",
    "Austin", "Jared", "Michael", "Mike", "Matthew", "Matt", "Paul", "Blake", "Dillon", "Dylan",
    "Dave", "Daniel", "Dan", "Sam", "Stewart", "Alex", "Alexander", "Alec", "Beau", "Zachary",
    "Ben", "Derek", "Tom", "Jim", "James", "Zack", "Mark", "Jesse", "Billy", "Dick", "Reid", "Alan",
    "Andrew", "Kyle", "Jason", "Jacob", "Jake", "Nathan", "Eric", "Erik", "Steve", "Stephen",
    "Steven", "Travis", "Trevor", "Brady", "Brenden", "Kevin", "Ethan", "Tucker", "Nick", "Chris",
    "Peter", "Patrick",
];

/// Everything a board needs to build and run an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub player_count: usize,
    pub food_count: usize,
    pub enemy_count: usize,
    /// Width and height of the board. Entities start in `[0, size)` and move within `[0, size]`.
    pub size: usize,
    pub use_names: bool,
    pub seed: u64,
    pub names: Vec<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            player_count: 1,
            food_count: 1,
            enemy_count: 1,
            size: BOARD_SIZE,
            use_names: true,
            seed: DEFAULT_SEED,
            names: DEFAULT_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl BoardConfig {
    /// Creates a configuration with the given population and default everything else.
    pub fn new(player_count: usize, food_count: usize, enemy_count: usize) -> Self {
        Self {
            player_count,
            food_count,
            enemy_count,
            ..Self::default()
        }
    }

    /// Sets the width and height of the board.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Sets the seed the board's random source starts from.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Turns player naming on or off.
    pub fn with_names_enabled(mut self, use_names: bool) -> Self {
        self.use_names = use_names;
        self
    }

    /// Replaces the name pool players draw their labels from.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Total number of entities placed at the start of an episode.
    pub fn initial_population(&self) -> usize {
        self.player_count + self.food_count + self.enemy_count
    }

    /// Checks the preconditions a board relies on while populating.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.player_count == 0 {
            return Err(BoardError::NoPlayers);
        }
        if self.size == 0 {
            return Err(BoardError::ZeroSize);
        }
        if self.use_names && self.names.len() < self.player_count {
            return Err(BoardError::NamePoolTooSmall {
                requested: self.player_count,
                available: self.names.len(),
            });
        }
        // Start cells are drawn from [0, size) on each axis
        let capacity = self.size.saturating_mul(self.size);
        let requested = self.initial_population();
        if requested > capacity {
            return Err(BoardError::Overcrowded {
                requested,
                capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        assert_eq!((MOVE_PENALTY, ENEMY_PENALTY, FOOD_REWARD, TURN_CAP), (1, 300, 25, 200));
        let config = BoardConfig::default();
        assert_eq!(config.size, 10);
        assert_eq!(config.seed, 1);
        assert!(config.use_names);
        assert_eq!(config.names.len(), DEFAULT_NAMES.len());
    }

    #[test]
    fn rejects_missing_players() {
        assert_eq!(
            BoardConfig::new(0, 3, 3).validate(),
            Err(BoardError::NoPlayers)
        );
    }

    #[test]
    fn rejects_zero_size() {
        assert_eq!(
            BoardConfig::new(1, 1, 1).with_size(0).validate(),
            Err(BoardError::ZeroSize)
        );
    }

    #[test]
    fn rejects_small_name_pool() {
        let config = BoardConfig::new(3, 0, 0).with_names(["Ann", "Bob"]);
        assert_eq!(
            config.validate(),
            Err(BoardError::NamePoolTooSmall {
                requested: 3,
                available: 2
            })
        );
    }

    #[test]
    fn small_name_pool_is_fine_without_names() {
        let config = BoardConfig::new(3, 0, 0)
            .with_names(["Ann"])
            .with_names_enabled(false);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_population_larger_than_board() {
        let config = BoardConfig::new(2, 2, 1).with_size(2);
        assert_eq!(
            config.validate(),
            Err(BoardError::Overcrowded {
                requested: 5,
                capacity: 4
            })
        );
    }

    #[test]
    fn zero_food_and_enemies_are_allowed() {
        assert_eq!(BoardConfig::new(1, 0, 0).validate(), Ok(()));
    }
}
