pub mod api;
pub mod config;
pub mod course;
pub mod database;
pub mod error;
pub mod navigation;
pub mod progress;
pub mod session;
pub mod user;
pub mod utils;
