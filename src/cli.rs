use crate::loader::WhichTests;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Default variant description looked up when no reference is given.
pub const DEFAULT_REFERENCE: &str = "muxsuite.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML settings file (defaults to ./muxsuite.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the tests the references resolve to
    List(SuiteArgs),
    /// Resolve the suite and emit the JSON manifest for the test runner
    Run(SuiteArgs),
}

impl Command {
    pub fn suite_args(&self) -> &SuiteArgs {
        match self {
            Command::List(args) | Command::Run(args) => args,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct SuiteArgs {
    /// Variant descriptions or plain test references
    #[arg(default_value = DEFAULT_REFERENCE)]
    pub references: Vec<String>,

    /// Filter only part of the YAML suite file
    #[arg(long = "mux-suite-only", num_args = 1..)]
    pub mux_suite_only: Vec<String>,

    /// Filter out part of the YAML suite file
    #[arg(long = "mux-suite-out", num_args = 1..)]
    pub mux_suite_out: Vec<String>,

    /// Which discovered entries to report
    #[arg(long, value_enum, default_value_t = WhichTests::Default)]
    pub which_tests: WhichTests,

    /// Do not fall back to plain file discovery for references without variants
    #[arg(long)]
    pub mux_only: bool,

    /// Print the suite as JSON
    #[arg(long)]
    pub json: bool,
}
