//! Identity ports.

pub mod ports;
