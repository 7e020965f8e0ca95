//! # Promoter Library
//!
//! This library exposes the promoter modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;
pub mod logging;
pub mod promoter;
pub mod session;
pub mod store;

pub use promoter::{Promoter, PromoterConfig};

// Re-export the logic and client crates for convenience
pub use promoter_core;
pub use promoter_firebase;
