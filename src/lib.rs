pub mod config;
pub mod error;
pub mod features;
pub mod host;
pub mod model;
pub mod server;
pub mod types;

pub use error::{ModelError, ServiceError, StartupError};
pub use host::ModelHost;
pub use server::{router, AppState};
