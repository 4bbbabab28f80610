pub mod defaults;
pub mod paths;
pub mod service;
pub mod validation;

pub use defaults::{AppConfig, EngineConfig, LoggingConfig, ServerConfig};
pub use paths::AppPaths;
pub use service::ConfigService;
