//! Error types shared by the rules, the engine glue and the game protocol.

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid FEN: {message}")]
    InvalidFen { message: String },

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Invalid message: {message}")]
    InvalidMessage { message: String },

    #[error("Game has not started yet")]
    NotStarted,

    #[error("Game is already over")]
    GameOver,

    /// The engine was asked to move in a position without legal moves.
    #[error("Engine has no move to play")]
    NoEngineMove,

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GameError {
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage { message: message.into() }
    }

    pub fn invalid_fen(message: impl Into<String>) -> Self {
        Self::InvalidFen { message: message.into() }
    }
}

pub type GameResult<T> = Result<T, GameError>;
