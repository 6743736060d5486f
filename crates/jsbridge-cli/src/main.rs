//! jsbridge: command-line script runner
//!
//! Initializes the global allocator, sets up logging, builds an engine
//! from the command line (and an optional TOML config) and evaluates a
//! script file and/or an inline expression.

use anyhow::{Context as _, Result};
use clap::Parser;
use jsbridge::{Engine, EngineConfig};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "jsbridge", version, about = "Run JavaScript through the jsbridge embedding layer")]
struct Args {
    /// Evaluate SOURCE (after FILE, if both are given)
    #[arg(short = 'e', long = "eval", value_name = "SOURCE")]
    eval: Option<String>,

    /// TOML engine configuration
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the memory limit (bytes)
    #[arg(long = "memory-limit", value_name = "BYTES")]
    memory_limit: Option<usize>,

    /// Override the GC threshold (bytes)
    #[arg(long = "gc-threshold", value_name = "BYTES")]
    gc_threshold: Option<usize>,

    /// Enable print, std and os
    #[arg(long = "std", default_value_t = false)]
    std: bool,

    /// Print heap statistics as JSON on exit
    #[arg(long = "stats", default_value_t = false)]
    stats: bool,

    /// Raise log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Script file to evaluate
    file: Option<PathBuf>,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EngineConfig::standard(),
        };

        if self.memory_limit.is_some() {
            config.memory_limit = self.memory_limit;
        }
        if self.gc_threshold.is_some() {
            config.gc_threshold = self.gc_threshold;
        }
        config.extended_capabilities |= self.std;

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    info!("jsbridge starting...");

    if args.file.is_none() && args.eval.is_none() {
        anyhow::bail!("nothing to run: pass a script FILE or --eval SOURCE");
    }

    let config = args.engine_config()?;
    debug!("Engine config: {:?}", config);

    let engine = Engine::with_config(&config)?;
    engine.set_console_log(|message| println!("{message}"));

    if let Some(path) = &args.file {
        let result = engine
            .eval_file(path)
            .with_context(|| format!("evaluating {}", path.display()))?;
        println!("{result}");
    }

    if let Some(source) = &args.eval {
        let result = engine.eval(source).context("evaluating --eval source")?;
        println!("{result}");
    }

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&engine.heap_stats())?);
    }

    info!("{}", engine.memory_summary());
    info!("jsbridge shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["jsbridge", "-e", "1 + 1", "--std", "--memory-limit", "1048576", "-vv"]);

        assert_eq!(args.eval.as_deref(), Some("1 + 1"));
        assert!(args.std);
        assert_eq!(args.verbose, 2);
        assert!(args.file.is_none());

        let config = args.engine_config().unwrap();
        assert_eq!(config.memory_limit, Some(1024 * 1024));
        assert!(config.extended_capabilities);
    }

    #[test]
    fn test_args_invalid_overrides() {
        let args = Args::parse_from([
            "jsbridge",
            "--memory-limit",
            "1024",
            "--gc-threshold",
            "4096",
            "script.js",
        ]);

        assert_eq!(args.file, Some(PathBuf::from("script.js")));
        assert!(args.engine_config().is_err());
    }
}
