mod cli;
mod error;
mod exit;

use clap::Parser;
use cli::{Cli, Commands};
use mgen_types::Config;

fn main() {
    let parsed = Cli::parse();

    let result = match parsed.command {
        Some(Commands::Convert {
            input,
            target,
            output_dir,
            optimization,
            enable_formal_verification,
            enable_advanced_analysis,
            enable_compile_time_optimization,
        }) => {
            let config = Config {
                target: target.into(),
                optimization: optimization.into(),
                enable_formal_verification,
                enable_advanced_analysis,
                enable_compile_time_optimization,
            };
            cli::convert_file(&input, config, output_dir)
        }
        Some(Commands::Check { input, target }) => cli::check_file(&input, target.into()),
        Some(Commands::Targets) => {
            cli::list_targets();
            Ok(())
        }
        None => Ok(()),
    };

    if let Err(error) = result {
        exit::with_code(error.exit_code(), &error.to_string());
    }
}
