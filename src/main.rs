//! Main entry point for the muxsuite application.

use clap::Parser;
use log::LevelFilter;
use muxsuite::cli::{Args, Command, SuiteArgs};
use muxsuite::config::{Settings, MUX_SUITE_ONLY, MUX_SUITE_OUT};
use muxsuite::error::ConfigError;
use muxsuite::{
    collect_suite, display_collection_results, suite_manifest, CollectionOptions, LoaderRegistry,
    MuxSuiteLoader,
};
use std::env;

pub fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let suite_args = args.command.suite_args();
    let loader = MuxSuiteLoader::new(
        apply_cli_filters(settings, suite_args),
        LoaderRegistry::with_builtin_loaders(),
    );
    let options = CollectionOptions {
        which: suite_args.which_tests,
        mux_only: suite_args.mux_only,
    };

    let suite = match collect_suite(&loader, &suite_args.references, &options) {
        Ok(suite) => suite,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match &args.command {
        Command::List(list) if !list.json => display_collection_results(&suite),
        Command::Run(_) if suite.is_empty() => {
            println!("No tests found.");
        }
        _ => println!("{:#}", suite_manifest(&suite)),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, takes precedence over -v.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_settings(args: &Args) -> Result<Settings, ConfigError> {
    match &args.config {
        Some(path) => Settings::from_file(path),
        None => {
            let root = env::current_dir().map_err(|source| ConfigError::Io {
                path: ".".into(),
                source,
            })?;
            Settings::load(&root)
        }
    }
}

fn apply_cli_filters(settings: Settings, suite_args: &SuiteArgs) -> Settings {
    let mut settings = settings;
    let (only, out) = (&suite_args.mux_suite_only, &suite_args.mux_suite_out);
    if !only.is_empty() {
        settings = settings.with(MUX_SUITE_ONLY, only.clone());
    }
    if !out.is_empty() {
        settings = settings.with(MUX_SUITE_OUT, out.clone());
    }
    settings
}
