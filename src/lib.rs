//! f1cast library
//!
//! Cached, rate-limited access to the Jolpica F1 API and the scoring used to
//! rank drivers for the next race. The binary in `main.rs` is a thin wrapper.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod report;
pub mod scoring;
