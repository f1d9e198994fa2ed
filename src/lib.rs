//! Library crate for port-scan-rs exposing reusable modules.
pub mod banner;
pub mod ports;
pub mod scanner;
pub mod types;
