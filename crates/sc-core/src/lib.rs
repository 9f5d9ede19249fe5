//! # sc-core
//!
//! Core types, traits, and utilities for Service Center RS.
//!
//! This crate provides the building blocks shared by every other crate:
//! - The error taxonomy (`ScError`, `ValidationErrors`)
//! - Result type alias
//! - The `Clock` port used for "now" and "today"
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
