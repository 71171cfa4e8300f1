//! # ScreenDesk Common Library
//!
//! Shared code for the ScreenDesk screening console:
//! - Error and result types
//! - Event types (ConsoleEvent enum) and the broadcast event bus
//! - Configuration loading and root folder resolution
//! - SSE utilities

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
