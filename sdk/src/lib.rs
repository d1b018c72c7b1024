pub mod auth;
pub mod client;
pub mod config;
pub mod connection_string;
pub mod discovery;
pub mod error;
pub mod harness;
pub mod partition;
pub mod pool;
