//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuditSettings, CacheSettings, LogFormat, LoggingConfig, ModelSettings,
    ServerConfig,
};
