use crate::target::Target;
use mgen_derive::NamedEnum;

/// Threshold for the optional optimizer passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, NamedEnum)]
pub enum OptimizationLevel {
    None,
    Basic,
    Moderate,
    Aggressive,
}

/// Configuration consumed by the translation pipeline
///
/// The command-line driver populates this from its flags; the pipeline and
/// the checkers read it. The verification and advanced-analysis switches are
/// accepted and recorded but their passes are reserved and disabled by
/// default.
#[derive(Debug, Clone)]
pub struct Config {
    /// The target language to emit
    pub target: Target,
    /// Threshold for the optional optimizer passes
    pub optimization: OptimizationLevel,
    /// Run the formal verifiers (reserved)
    pub enable_formal_verification: bool,
    /// Run the advanced analyzers (reserved)
    pub enable_advanced_analysis: bool,
    /// Run the source-level optimizer
    pub enable_compile_time_optimization: bool,
}

impl Config {
    /// Creates a configuration for the given target with every optional
    /// pass disabled
    pub fn for_target(target: Target) -> Self {
        Config {
            target,
            optimization: OptimizationLevel::None,
            enable_formal_verification: false,
            enable_advanced_analysis: false,
            enable_compile_time_optimization: false,
        }
    }

    /// Check if the source-level optimizer phase should run
    pub fn run_source_optimizer(&self) -> bool {
        self.enable_compile_time_optimization && self.optimization >= OptimizationLevel::Basic
    }

    /// Check if the target-level optimizer phase should run
    pub fn run_target_optimizer(&self) -> bool {
        self.optimization >= OptimizationLevel::Moderate
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::for_target(Target::C)
    }
}
