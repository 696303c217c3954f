//! HTTP layer: request verification, parsing, and endpoint handlers

pub mod dedup;
pub mod event_handler;
pub mod extract;
pub mod helpers;
pub mod interactive_handler;
pub mod parsing;
pub mod router;
pub mod signature;
pub mod slash_handler;
pub mod state;

// Re-export the router and state for convenience
pub use router::build_router;
pub use state::AppState;
