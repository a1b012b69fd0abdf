//! Weaver Core: configuration and observability shared by the gateway crates.

pub mod config;
pub mod observability;
