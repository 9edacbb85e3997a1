//! Blob storage ports.

pub mod ports;
