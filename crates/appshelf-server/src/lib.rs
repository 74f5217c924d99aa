//! AppShelf local HTTP shell: JSON API over the store, research, viewer and quant crates.

pub mod error;
pub mod markdown;
pub mod routes;
pub mod state;
pub mod validate;

pub use routes::build_router;
pub use state::AppState;
