//! Local two-player tic-tac-toe game state.
//!
//! The board is purely client-side; only the win/loss counters live on the
//! server (see `ApiClient::fetch_game_stats`).

pub mod board;

pub use board::{Board, Mark};
