//! Connection and OAuth flow-state ports.

pub mod ports;
