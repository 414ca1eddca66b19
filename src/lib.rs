pub mod config;
pub mod handler;
pub mod logging;
pub mod prompt;
pub mod providers;
pub mod sanitize;
pub mod server;
pub mod types;
