pub mod address;
pub mod api;
mod config;
mod error;
pub mod helpers;
mod types;
pub mod version;

pub use address::{validate_ipv4, AddressError};
pub use config::*;
pub use error::IpSentinelError;
pub use types::*;
