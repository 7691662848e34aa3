//! Type model shared by every phase of the MGen translator
//!
//! This crate defines the semantic types assigned to expressions during
//! analysis, the container kinds recognized by the conversion strategies,
//! the per-parameter mutability classes, the set of supported targets, and
//! the pipeline configuration.

pub mod config;
pub mod container;
pub mod mutability;
pub mod phase;
pub mod semantic_type;
pub mod target;

pub use config::{Config, OptimizationLevel};
pub use container::ContainerKind;
pub use mutability::Mutability;
pub use phase::{Phase, ALL_PHASES};
pub use semantic_type::{
    SemanticType, TYPE_NAME_BOOL, TYPE_NAME_DICT, TYPE_NAME_FLOAT, TYPE_NAME_INT, TYPE_NAME_LIST,
    TYPE_NAME_NONE, TYPE_NAME_SET, TYPE_NAME_STR, TYPE_NAME_TUPLE,
};
pub use target::{Target, ALL_TARGETS};
