pub mod config;
pub mod inventory;
pub mod target;
