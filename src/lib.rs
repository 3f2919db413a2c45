// Library modules for integration tests
pub mod api;
pub mod audio;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod processing;
pub mod providers;
pub mod rate_limit;
pub mod server;
pub mod utils;
