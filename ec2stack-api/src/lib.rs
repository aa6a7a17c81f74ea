pub mod auth;
pub mod config;
pub mod error;
pub mod render;
pub mod routes;
pub mod signature;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_app;
pub use state::AppState;
