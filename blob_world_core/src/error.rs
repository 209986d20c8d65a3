/// Represents errors raised while setting up a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("A board needs at least one player")]
    NoPlayers,
    #[error("Board size must be at least 1")]
    ZeroSize,
    #[error("Name pool has {available} names but {requested} players were requested")]
    NamePoolTooSmall { requested: usize, available: usize },
    #[error("Cannot place {requested} entities on a board with {capacity} free cells")]
    Overcrowded { requested: usize, capacity: usize },
}
