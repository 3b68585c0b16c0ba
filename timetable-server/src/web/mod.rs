//! Web layer for the timetable server.
//!
//! Provides the search page, JSON endpoints for station autocomplete,
//! connections and departure boards, and an optional live board.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
