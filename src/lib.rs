pub mod config;
pub mod error;
pub mod image;
pub mod inference;
pub mod server;
