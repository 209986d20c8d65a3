use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};
use serde::{Deserialize, Serialize};

use crate::{
    EntityId, Position, Role,
    config::{BoardConfig, ENEMY_PENALTY, FOOD_REWARD, MOVE_PENALTY, TURN_CAP},
    entity::Entity,
    error::BoardError,
};

/// Represents the move a player makes on one step.
///
/// Components larger than one are truncated to a single unit per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Wait,
    Move { dx: isize, dy: isize },
}

impl Action {
    /// Raw displacement requested by this action.
    pub fn delta(&self) -> (f64, f64) {
        match *self {
            Action::Wait => (0.0, 0.0),
            Action::Move { dx, dy } => (dx as f64, dy as f64),
        }
    }
}

impl From<(isize, isize)> for Action {
    fn from((dx, dy): (isize, isize)) -> Self {
        Action::Move { dx, dy }
    }
}

/// Snapshot of every entity's coordinates, grouped by role.
///
/// Each list follows the order of the board's collections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub players: Vec<Position>,
    pub food: Vec<Position>,
    pub enemies: Vec<Position>,
}

impl Observation {
    /// Splits the snapshot into `(players, food, enemies)`.
    pub fn into_tuple(self) -> (Vec<Position>, Vec<Position>, Vec<Position>) {
        (self.players, self.food, self.enemies)
    }

    /// Returns the coordinates recorded for `role`.
    pub fn positions(&self, role: Role) -> &[Position] {
        match role {
            Role::Player => &self.players,
            Role::Food => &self.food,
            Role::Enemy => &self.enemies,
        }
    }
}

/// Outcome of a single [`Board::step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    /// Cumulative score for the episode so far.
    pub score: i64,
    pub done: bool,
}

/// Owns every blob of an episode and advances it one step at a time.
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    players: Vec<Entity>,
    food: Vec<Entity>,
    enemies: Vec<Entity>,
    score: i64,
    turn_count: u32,
    done: bool,
    turn_cap: u32,
    rng: StdRng,
    next_entity_id: EntityId,
}

impl Board {
    /// Validates the configuration and sets up the first episode.
    pub fn new(config: BoardConfig) -> Result<Self, BoardError> {
        config.validate()?;
        let mut board = Board {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            players: Vec::new(),
            food: Vec::new(),
            enemies: Vec::new(),
            score: 0,
            turn_count: 0,
            done: false,
            turn_cap: TURN_CAP,
            next_entity_id: 0,
        };
        board.reset();
        Ok(board)
    }

    /// Starts a new episode from the configured seed.
    ///
    /// Resetting twice without changing the seed replays the same episode.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.score = 0;
        self.turn_count = 0;
        self.done = false;
        self.next_entity_id = 0;
        self.players.clear();
        self.food.clear();
        self.enemies.clear();
        self.populate();
        debug!(
            "Board reset with seed {}: {} players, {} food, {} enemies",
            self.config.seed,
            self.players.len(),
            self.food.len(),
            self.enemies.len()
        );
    }

    /// Stores a new seed and starts a new episode from it.
    pub fn reset_with_seed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.reset();
    }

    /// Places the initial population, no two entities sharing a cell.
    fn populate(&mut self) {
        let names: Vec<String> = if self.config.use_names {
            let picks = index::sample(
                &mut self.rng,
                self.config.names.len(),
                self.config.player_count,
            );
            picks
                .iter()
                .map(|i| self.config.names[i].clone())
                .collect()
        } else {
            Vec::new()
        };

        let size = self.config.size;
        let mut claimed: Vec<Position> = Vec::with_capacity(self.config.initial_population());
        for role in Role::ALL {
            for slot in 0..self.role_count(role) {
                let label = match role {
                    Role::Player => names.get(slot).cloned(),
                    Role::Food => Some("Food".to_string()),
                    Role::Enemy => Some(format!("Enemy{slot}")),
                };
                let id = self.reserve_entity_id();
                let mut blob = Entity::spawn(id, role, label.clone(), size, &mut self.rng);
                while claimed.contains(&blob.position()) {
                    blob = Entity::spawn(id, role, label.clone(), size, &mut self.rng);
                }
                claimed.push(blob.position());
                self.collection_mut(role).push(blob);
            }
        }
    }

    fn reserve_entity_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    fn role_count(&self, role: Role) -> usize {
        match role {
            Role::Player => self.config.player_count,
            Role::Food => self.config.food_count,
            Role::Enemy => self.config.enemy_count,
        }
    }

    fn collection_mut(&mut self, role: Role) -> &mut Vec<Entity> {
        match role {
            Role::Player => &mut self.players,
            Role::Food => &mut self.food,
            Role::Enemy => &mut self.enemies,
        }
    }

    /// Advances the episode by one turn.
    ///
    /// `actions` is matched to the live players by index. Players without an
    /// action stay put and are not charged the move penalty; surplus actions
    /// are ignored. Stepping a finished episode changes nothing.
    pub fn step(&mut self, actions: &[Action]) -> StepResult {
        if self.done {
            warn!(
                "Step requested after the episode ended on turn {}",
                self.turn_count
            );
            return self.result();
        }

        self.turn_count += 1;
        self.move_players(actions);
        self.move_enemies();
        self.resolve_collisions();
        self.spawn_food();
        self.update_done();

        debug!(
            "Turn {}: score {}, {} players, {} food, {} enemies",
            self.turn_count,
            self.score,
            self.players.len(),
            self.food.len(),
            self.enemies.len()
        );
        self.result()
    }

    fn move_players(&mut self, actions: &[Action]) {
        if actions.len() > self.players.len() {
            warn!(
                "Got {} actions for {} players, ignoring the surplus",
                actions.len(),
                self.players.len()
            );
        } else if actions.len() < self.players.len() {
            debug!(
                "Got {} actions for {} players, the rest wait for free",
                actions.len(),
                self.players.len()
            );
        }

        for (player, action) in self.players.iter_mut().zip(actions) {
            let (dx, dy) = action.delta();
            player.apply_action(dx, dy);
            self.score -= MOVE_PENALTY;
        }
    }

    /// Random walk: both axes drawn from `[-1, 1]` independently.
    fn move_enemies(&mut self) {
        for enemy in &mut self.enemies {
            let dx: f64 = self.rng.random_range(-1.0..=1.0);
            let dy: f64 = self.rng.random_range(-1.0..=1.0);
            enemy.apply_action(dx, dy);
        }
    }

    /// Scores player contacts with enemies and food, then removes the casualties.
    ///
    /// Every player is checked against food, including players caught this
    /// turn. A food item can only be eaten once.
    fn resolve_collisions(&mut self) {
        let enemy_index = bucket_index(&self.enemies);
        let mut caught: HashSet<EntityId> = HashSet::new();
        for player in &self.players {
            let pos = player.position();
            let hit = pos
                .cell()
                .and_then(|cell| enemy_index.get(&cell))
                .is_some_and(|bucket| bucket.iter().any(|&i| self.enemies[i].position() == pos));
            if hit {
                self.score -= ENEMY_PENALTY;
                caught.insert(player.id());
                debug!("{} was caught at {}", player, pos);
            }
        }

        let food_index = bucket_index(&self.food);
        let mut eaten: HashSet<EntityId> = HashSet::new();
        for player in &self.players {
            let pos = player.position();
            let Some(bucket) = pos.cell().and_then(|cell| food_index.get(&cell)) else {
                continue;
            };
            for &i in bucket {
                let food = &self.food[i];
                if food.position() == pos && eaten.insert(food.id()) {
                    self.score += FOOD_REWARD;
                    info!("Food found at {}", pos);
                }
            }
        }

        if !caught.is_empty() {
            self.players.retain(|player| !caught.contains(&player.id()));
        }
        if !eaten.is_empty() {
            self.food.retain(|food| !eaten.contains(&food.id()));
        }
    }

    /// Adds one food item anywhere on the board, occupied or not.
    fn spawn_food(&mut self) {
        let id = self.reserve_entity_id();
        let food = Entity::spawn(
            id,
            Role::Food,
            Some("Food".to_string()),
            self.config.size,
            &mut self.rng,
        );
        self.food.push(food);
    }

    fn update_done(&mut self) {
        if self.players.is_empty() {
            info!(
                "All players lost on turn {}, final score {}",
                self.turn_count, self.score
            );
            self.done = true;
        } else if self.turn_count >= self.turn_cap {
            info!(
                "Turn cap {} reached with {} players alive, final score {}",
                self.turn_cap,
                self.players.len(),
                self.score
            );
            self.done = true;
        }
    }

    fn result(&self) -> StepResult {
        StepResult {
            observation: self.observation(),
            score: self.score,
            done: self.done,
        }
    }

    /// Copies out the coordinates of every entity.
    pub fn observation(&self) -> Observation {
        let positions = |entities: &[Entity]| -> Vec<Position> {
            entities.iter().map(Entity::position).collect()
        };
        Observation {
            players: positions(&self.players),
            food: positions(&self.food),
            enemies: positions(&self.enemies),
        }
    }

    /// Returns the live players in action order.
    pub fn players(&self) -> &[Entity] {
        &self.players
    }

    /// Returns the food currently on the board.
    pub fn food(&self) -> &[Entity] {
        &self.food
    }

    /// Returns the enemies on the board.
    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    /// Returns the entities playing `role`.
    pub fn entities(&self, role: Role) -> &[Entity] {
        match role {
            Role::Player => &self.players,
            Role::Food => &self.food,
            Role::Enemy => &self.enemies,
        }
    }

    /// Returns the cumulative score of the episode.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Returns the number of turns played this episode.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Returns `true` once the episode has ended.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns the turn after which the episode ends.
    pub fn turn_cap(&self) -> u32 {
        self.turn_cap
    }

    /// Returns the width and height of the board.
    pub fn size(&self) -> usize {
        self.config.size
    }

    /// Returns the configuration the board was built from.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn with_turn_cap(mut self, turn_cap: u32) -> Self {
        self.turn_cap = turn_cap;
        self
    }
}

/// Buckets entity indices by the cell they occupy.
///
/// Only occupied cells get an entry, so the index grows with the entity count
/// and not with the board area.
fn bucket_index(entities: &[Entity]) -> HashMap<(usize, usize), Vec<usize>> {
    let mut buckets: HashMap<(usize, usize), Vec<usize>> = HashMap::with_capacity(entities.len());
    for (i, entity) in entities.iter().enumerate() {
        if let Some(cell) = entity.position().cell() {
            buckets.entry(cell).or_default().push(i);
        }
    }
    buckets
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for player in &self.players {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", player)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(players: usize, food: usize, enemies: usize, seed: u64) -> Board {
        Board::new(BoardConfig::new(players, food, enemies).with_seed(seed)).unwrap()
    }

    fn force(board: &mut Board, role: Role, index: usize, position: Position) {
        board.collection_mut(role)[index].place(position);
    }

    #[test]
    fn fresh_board_has_configured_population() {
        let board = board(1, 1, 0, 42);
        assert_eq!(board.players().len(), 1);
        assert_eq!(board.food().len(), 1);
        assert!(board.enemies().is_empty());
        assert_ne!(board.players()[0].position(), board.food()[0].position());
        assert_eq!(board.score(), 0);
        assert_eq!(board.turn_count(), 0);
        assert!(!board.is_done());
    }

    #[test]
    fn waiting_costs_one_point_and_grows_food() {
        let mut board = board(1, 1, 0, 42);
        let start = board.players()[0].position();

        let result = board.step(&[Action::Move { dx: 0, dy: 0 }]);

        assert_eq!(board.players()[0].position(), start);
        assert_eq!(result.score, -1);
        assert_eq!(result.observation.food.len(), 2);
        assert!(!result.done);
    }

    #[test]
    fn labels_follow_roles() {
        let board = board(3, 2, 2, 5);
        let names: HashSet<&str> = board.players().iter().filter_map(Entity::label).collect();
        assert_eq!(names.len(), 3);
        for name in &names {
            assert!(board.config().names.iter().any(|n| n == name));
        }
        assert!(board.food().iter().all(|f| f.label() == Some("Food")));
        let enemies: Vec<_> = board.enemies().iter().map(Entity::label).collect();
        assert_eq!(enemies, vec![Some("Enemy0"), Some("Enemy1")]);
    }

    #[test]
    fn players_are_unnamed_when_names_are_off() {
        let config = BoardConfig::new(4, 0, 0).with_names_enabled(false);
        let board = Board::new(config).unwrap();
        assert!(board.players().iter().all(|p| p.label().is_none()));
    }

    #[test]
    fn equal_role_counts_still_fill_every_role() {
        let board = board(2, 2, 2, 3);
        assert!(board.players().iter().all(|e| e.role() == Role::Player));
        assert!(board.food().iter().all(|e| e.role() == Role::Food));
        assert!(board.enemies().iter().all(|e| e.role() == Role::Enemy));
        assert_eq!(
            (board.players().len(), board.food().len(), board.enemies().len()),
            (2, 2, 2)
        );
    }

    #[test]
    fn full_board_places_every_cell_once() {
        let config = BoardConfig::new(4, 6, 6).with_size(4).with_seed(11);
        let board = Board::new(config).unwrap();
        let mut cells: Vec<_> = Role::ALL
            .iter()
            .flat_map(|&role| board.entities(role))
            .filter_map(|e| e.position().cell())
            .collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 16);
    }

    #[test]
    fn player_on_food_scores_reward() {
        let mut board = board(1, 1, 0, 42);
        let spot = board.players()[0].position();
        force(&mut board, Role::Food, 0, spot);
        let eaten_id = board.food()[0].id();

        let result = board.step(&[Action::Wait]);

        assert_eq!(result.score, -1 + 25);
        assert_eq!(board.food().len(), 1);
        assert!(board.food().iter().all(|f| f.id() != eaten_id));
        assert_eq!(board.players().len(), 1);
    }

    #[test]
    fn shared_food_is_eaten_once() {
        let mut board = board(2, 1, 0, 8);
        let spot = Position::new(4.0, 4.0);
        force(&mut board, Role::Player, 0, spot);
        force(&mut board, Role::Player, 1, spot);
        force(&mut board, Role::Food, 0, spot);

        let result = board.step(&[Action::Wait, Action::Wait]);

        assert_eq!(result.score, -2 + 25);
    }

    #[test]
    fn collision_with_enemy_removes_player() {
        let mut board = board(2, 0, 1, 9);
        let spot = board.enemies()[0].position();
        force(&mut board, Role::Player, 0, spot);
        let caught_id = board.players()[0].id();
        let survivor_id = board.players()[1].id();

        board.resolve_collisions();

        assert_eq!(board.score(), -300);
        let ids: Vec<_> = board.players().iter().map(Entity::id).collect();
        assert_eq!(ids, vec![survivor_id]);
        assert_ne!(ids[0], caught_id);
    }

    #[test]
    fn stacked_enemies_cost_one_penalty() {
        let mut board = board(1, 0, 2, 4);
        let spot = Position::new(2.0, 2.0);
        force(&mut board, Role::Enemy, 0, spot);
        force(&mut board, Role::Enemy, 1, spot);
        force(&mut board, Role::Player, 0, spot);

        board.resolve_collisions();

        assert_eq!(board.score(), -300);
        assert!(board.players().is_empty());
    }

    #[test]
    fn caught_player_still_eats_food_underfoot() {
        let mut board = board(1, 1, 1, 13);
        let spot = Position::new(6.0, 1.0);
        force(&mut board, Role::Player, 0, spot);
        force(&mut board, Role::Food, 0, spot);
        force(&mut board, Role::Enemy, 0, spot);

        board.resolve_collisions();

        assert_eq!(board.score(), -300 + 25);
        assert!(board.players().is_empty());
        assert!(board.food().is_empty());
    }

    #[test]
    fn fractional_enemy_near_player_is_no_contact() {
        let mut board = board(1, 0, 1, 21);
        force(&mut board, Role::Player, 0, Position::new(3.0, 3.0));
        force(&mut board, Role::Enemy, 0, Position::new(3.4, 3.0));

        board.resolve_collisions();

        assert_eq!(board.score(), 0);
        assert_eq!(board.players().len(), 1);
    }

    #[test]
    fn losing_last_player_ends_episode_same_step() {
        let mut board = board(1, 0, 1, 77);

        // Enemies draw the same random walk from the same state, so a clone
        // shows where the enemy lands this turn.
        let mut preview = board.clone();
        preview.step(&[Action::Wait]);
        let landing = preview.enemies()[0].position();
        force(&mut board, Role::Player, 0, landing);

        let result = board.step(&[Action::Wait]);

        assert_eq!(result.score, -1 - 300);
        assert!(result.observation.players.is_empty());
        assert!(result.done);
    }

    #[test]
    fn turn_cap_ends_episode() {
        let mut board = board(1, 0, 0, 1);
        for _ in 0..199 {
            assert!(!board.step(&[Action::Wait]).done);
        }
        let result = board.step(&[Action::Wait]);
        assert!(result.done);
        assert_eq!(board.turn_count(), 200);
        assert_eq!(result.score, -200);
    }

    #[test]
    fn shorter_turn_cap_is_enforced() {
        let mut board = board(1, 0, 0, 1).with_turn_cap(3);
        assert_eq!(board.turn_cap(), 3);
        assert!(!board.step(&[]).done);
        assert!(!board.step(&[]).done);
        assert!(board.step(&[]).done);
    }

    #[test]
    fn finished_board_ignores_further_steps() {
        let mut board = board(1, 0, 0, 1).with_turn_cap(1);
        let finished = board.step(&[Action::Wait]);
        assert!(finished.done);

        let again = board.step(&[Action::Move { dx: 1, dy: 1 }]);
        assert_eq!(again, finished);
        assert_eq!(board.turn_count(), 1);
    }

    #[test]
    fn huge_board_steps_without_area_sized_index() {
        let config = BoardConfig::new(1, 1, 1).with_size(1 << 32).with_seed(3);
        let mut board = Board::new(config).unwrap();
        for _ in 0..5 {
            board.step(&[Action::Move { dx: 1, dy: -1 }]);
        }
        assert_eq!(board.turn_count(), 5);
        assert_eq!(board.food().len(), 6);
        let bound = (1u64 << 32) as f64;
        for pos in board.observation().into_tuple().0 {
            assert!((0.0..=bound).contains(&pos.x) && (0.0..=bound).contains(&pos.y));
        }
    }

    #[test]
    fn huge_board_still_resolves_contacts() {
        let mut board = Board::new(BoardConfig::new(1, 1, 0).with_size(1 << 32)).unwrap();
        let far = Position::new(4_000_000_000.0, 3_999_999_999.0);
        force(&mut board, Role::Player, 0, far);
        force(&mut board, Role::Food, 0, far);

        let result = board.step(&[Action::Wait]);

        assert_eq!(result.score, -1 + 25);
        assert_eq!(board.food().len(), 1);
    }

    #[test]
    fn move_penalty_is_charged_per_acting_player() {
        let mut board = board(3, 0, 0, 2);
        let result = board.step(&[Action::Wait, Action::Wait, Action::Wait]);
        assert_eq!(result.score, -3);

        let before = board.players()[2].position();
        let result = board.step(&[(1, 0).into(), (0, 1).into()]);
        assert_eq!(result.score, -5);
        assert_eq!(board.players()[2].position(), before);
    }

    #[test]
    fn surplus_actions_are_ignored() {
        let mut board = board(1, 0, 0, 2);
        let result = board.step(&[Action::Wait, Action::Wait, Action::Wait]);
        assert_eq!(result.score, -1);
    }

    #[test]
    fn reset_restores_first_episode() {
        let mut board = board(2, 3, 2, 99);
        let initial = board.observation();
        for _ in 0..10 {
            board.step(&[(1, 1).into(), (-1, 0).into()]);
        }
        board.reset();
        assert_eq!(board.observation(), initial);
        assert_eq!(board.score(), 0);
        assert_eq!(board.turn_count(), 0);
        assert!(!board.is_done());
    }

    #[test]
    fn reset_with_seed_changes_layout() {
        let mut board = board(3, 3, 3, 1);
        let first = board.observation();
        board.reset_with_seed(2);
        assert_eq!(board.config().seed, 2);
        assert_ne!(board.observation(), first);
    }

    #[test]
    fn observation_is_a_copy() {
        let board = board(2, 2, 2, 6);
        let mut obs = board.observation();
        obs.players[0] = Position::new(-1.0, -1.0);
        obs.food.clear();
        assert_ne!(board.observation(), obs);
        assert_eq!(board.food().len(), 2);
    }

    #[test]
    fn display_lists_players() {
        let mut board = board(2, 0, 0, 6);
        force(&mut board, Role::Player, 0, Position::new(1.0, 2.0));
        force(&mut board, Role::Player, 1, Position::new(3.0, 4.0));
        let first = board.players()[0].label().unwrap().to_string();
        let second = board.players()[1].label().unwrap().to_string();
        assert_eq!(
            board.to_string(),
            format!("{first}: (1, 2) {second}: (3, 4)")
        );
    }
}
