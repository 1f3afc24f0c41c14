pub mod access_log;
pub mod db;
pub mod registry;
mod services;
pub mod users;

pub use services::*;
