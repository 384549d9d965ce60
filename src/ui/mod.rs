//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: screen rendering and layout
//! - `input`: keyboard event handling
//! - `styles`: color schemes and text styling

pub mod input;
pub mod render;
pub mod styles;
