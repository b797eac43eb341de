//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so the HTTP adapter can
//! serialize/deserialize without reaching into the state machine.

pub mod wizard;

pub use wizard::*;
