mod checkers;
mod cli;
mod inference;
mod loop_strategies;
mod mutability;
mod pipeline;
mod rejection;
mod scenarios;
mod targets;
pub mod test_utils;

// Re-export ErrorCode for use in tests
pub use mgen_error::ErrorCode;
