use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "cabrig_core=debug").
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Mirror log output into this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Switches shared by `build` and `run`.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ValidateOpts {
    /// Parameter value as NAME=VALUE. VALUE is parsed as JSON where possible,
    /// otherwise taken as a plain string. Can be specified multiple times.
    #[arg(short = 'p', long = "param", action = clap::ArgAction::Append)]
    pub params: Vec<String>,

    /// Substitution namespace entry as KEY=VALUE; dotted keys create nested
    /// tables. Can be specified multiple times.
    #[arg(short = 's', long = "subst", action = clap::ArgAction::Append)]
    pub substs: Vec<String>,

    /// Accept parameter sets with missing required values.
    #[arg(long, default_value_t = false)]
    pub ignore_missing: bool,

    /// Drop parameters the schema does not declare instead of rejecting them.
    #[arg(long, default_value_t = false)]
    pub allow_unknown: bool,

    /// Skip existence and kind checks for file and directory parameters.
    #[arg(long, default_value_t = false)]
    pub no_exist_check: bool,

    /// Keep glob patterns as literal values instead of expanding them.
    #[arg(long, default_value_t = false)]
    pub no_glob: bool,

    /// Create parent directories for output paths while validating.
    #[arg(long, default_value_t = false)]
    pub create_dirs: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InspectArgs {
    /// Path to the cab definition file (TOML).
    pub cab: PathBuf,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BuildArgs {
    /// Path to the cab definition file (TOML).
    pub cab: PathBuf,

    #[command(flatten)]
    pub opts: ValidateOpts,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Path to the cab definition file (TOML).
    pub cab: PathBuf,

    #[command(flatten)]
    pub opts: ValidateOpts,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inspect(InspectArgs),
    Build(BuildArgs),
    Run(RunArgs),
}
