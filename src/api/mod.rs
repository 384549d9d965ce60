//! REST API client module for the game service.
//!
//! This module provides the `ApiClient` for the authentication endpoints
//! (signup, verify, login, refresh, logout) and the game-statistics counter.
//!
//! Protected endpoints use bearer token authentication with the access token
//! obtained at login.

pub mod client;
pub mod error;

pub use client::{ApiClient, GameStats, RefreshedTokens};
pub use error::ApiError;
