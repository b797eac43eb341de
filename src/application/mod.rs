//! Application layer - Use cases and ports
//!
//! Services here coordinate the domain state machine with the outbound ports
//! (persistence, settings store, content generation). The HTTP adapter only
//! talks to these services.

pub mod dto;
pub mod ports;
pub mod services;
