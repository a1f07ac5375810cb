pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use coverquote_core::config::{AppConfig, LoadOptions};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::commands::{packages::PackagesArgs, quote::QuoteArgs};

#[derive(Debug, Parser)]
#[command(
    name = "coverquote",
    about = "Insurance quote wizard",
    long_about = "Collect a name, age, country and coverage package, price the premium, and buy the quote.",
    after_help = "Examples:\n  coverquote quote --name Ada --age 60 --country USD\n  coverquote packages --age 40\n  coverquote wizard"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a coverquote.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the wizard non-interactively and print the quote summary as JSON")]
    Quote {
        #[arg(long, help = "Name of the insured person")]
        name: Option<String>,
        #[arg(long, help = "Age in whole years (defaults to the configured default age)")]
        age: Option<u32>,
        #[arg(long, help = "Country id, e.g. HKD")]
        country: Option<String>,
        #[arg(long, help = "Package id, e.g. sd")]
        package: Option<String>,
        #[arg(long, help = "Also buy the quote after the summary")]
        buy: bool,
    },
    #[command(about = "List coverage packages with the price each adds")]
    Packages {
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        country: Option<String>,
    },
    #[command(about = "List the countries quotes can be priced for")]
    Countries,
    #[command(about = "Step through the quote wizard interactively")]
    Wizard,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        ..LoadOptions::default()
    };

    let logging = AppConfig::load(options.clone()).map(|config| config.logging).unwrap_or_default();
    logging::init(&logging);

    let result = match cli.command {
        Command::Quote { name, age, country, package, buy } => {
            commands::quote::run(QuoteArgs { name, age, country, package, buy }, options)
        }
        Command::Packages { age, country } => {
            commands::packages::run(PackagesArgs { age, country }, options)
        }
        Command::Countries => commands::countries::run(options),
        Command::Wizard => commands::wizard::run(options),
        Command::Config => commands::config::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
