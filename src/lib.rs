pub mod cmd;
pub mod config;
pub mod data;
pub mod error;
pub mod scheduler;
pub mod util;
