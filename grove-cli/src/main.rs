// grove-cli: CLI entry point for grove tools (generate, check).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "grove", about = "grove CLI: engine binding tools for Rust")]
struct Cli {
    /// Log more (repeat for trace output).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust bindings from extension_api.json.
    Generate {
        /// Path to grove.toml.
        #[arg(long, default_value = "grove.toml")]
        config: PathBuf,
    },
    /// Validate the descriptor and render the bindings without writing them.
    Check {
        /// Path to grove.toml.
        #[arg(long, default_value = "grove.toml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let result = match &cli.command {
        Commands::Generate { config } => grove_codegen::run_generate(config).map(|summary| {
            println!(
                "Generated {} classes into {} files under {}",
                summary.classes,
                summary.files,
                summary.out_dir.display()
            );
        }),
        Commands::Check { config } => grove_codegen::run_check(config).map(|summary| {
            println!("Descriptor OK: {} classes, {} files", summary.classes, summary.files);
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_grove_toml() {
        let cli = Cli::try_parse_from(["grove", "generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { config } if config == PathBuf::from("grove.toml")));
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::try_parse_from(["grove", "check", "--config", "x/grove.toml", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Check { config } if config == PathBuf::from("x/grove.toml")));
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(Cli::try_parse_from(["grove", "build"]).is_err());
    }
}
