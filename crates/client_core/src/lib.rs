//! Client side of the hiring board: the HTTP accessor for the hosted
//! candidate store, client configuration, and the presentation controller
//! that owns board state between store calls.

pub mod board;
pub mod config;
pub mod error;
pub mod http_store;

pub use board::{
    BoardColumn, BoardController, BoardSnapshot, BoardView, DeleteConfirmation, LoadState,
    PendingTransition, TransitionOutcome,
};
pub use config::{ClientConfig, ConfigError};
pub use error::BoardError;
pub use http_store::HttpCandidateStore;
