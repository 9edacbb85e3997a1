//! Catalog persistence ports.

pub mod ports;
