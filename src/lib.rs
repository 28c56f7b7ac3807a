//! imgkit - image tools server
//!
//! Compression, background removal, recognition and AI generation behind
//! one HTTP API. This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
