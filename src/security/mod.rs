//! Security utilities

pub mod timing;

pub use timing::{add_auth_delay, AuthTimer};
