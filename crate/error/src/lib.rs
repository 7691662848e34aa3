//! Error handling utilities for the MGen translator
//!
//! This crate provides centralized error handling types used across the
//! translator infrastructure: diagnostic error codes, the per-phase
//! translation error type, source line lookup, and the top-level error
//! taxonomy surfaced to callers.

pub mod error_codes;
pub mod line_info;
pub mod mgen_error;
pub mod translate_error;

pub use error_codes::ErrorCode;
pub use line_info::LineInfo;
pub use mgen_error::{MgenError, MgenResult};
pub use translate_error::{CompileResult, TranslateError};
