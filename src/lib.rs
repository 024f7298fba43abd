#[cfg(test)]
mod testing;

pub mod admin;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod model;
pub mod referral;
pub mod reporting;
pub mod sqlite_pragma;

pub use error::{AdminError, AdminResult};
