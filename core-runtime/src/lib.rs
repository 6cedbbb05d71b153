//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the breathing-session core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Typed event buses
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the cache and playback
//! components depend on. It establishes the logging conventions, the
//! configuration builder, and the event broadcasting used throughout.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
