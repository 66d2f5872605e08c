pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod lookup;
pub mod middleware;
pub mod prompt;
pub mod render;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;
