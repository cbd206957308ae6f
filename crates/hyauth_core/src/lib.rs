pub mod config;
pub mod device_flow;
pub mod entities;
pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, SignInError, Stage};
