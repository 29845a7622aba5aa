pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod routes;
pub mod sales;
pub mod server;
pub mod session;
pub mod state;

pub use config::{CliArgs, ServerConfig};
pub use error::{AppError, AppResult};
pub use logging::{LoggingConfig, init_logging};
pub use server::{build_router, run_server};
pub use state::AppState;
