use coverquote_core::config::LoadOptions;
use coverquote_core::{format_percent, QuoteSession};
use serde::Serialize;

use crate::commands::{load_runtime, CommandResult};

const COMMAND: &str = "packages";

#[derive(Clone, Debug, Default)]
pub struct PackagesArgs {
    pub age: Option<u32>,
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
struct PackageRow {
    id: String,
    name: String,
    loading_ratio: String,
    add_price: String,
    label: String,
}

#[derive(Debug, Serialize)]
struct PackagesReport {
    age: u32,
    country: String,
    standard_premium: String,
    packages: Vec<PackageRow>,
}

/// Lists every package with what it adds to the standard premium for the
/// given age and country, e.g. `Safe (+HK$250.00, 50%)`.
pub fn run(args: PackagesArgs, options: LoadOptions) -> CommandResult {
    let runtime = match load_runtime(COMMAND, options) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let mut session = QuoteSession::from_config(&runtime.config.wizard, runtime.catalog);
    if let Some(age) = args.age {
        session.set_age(age);
    }
    if let Some(country) = args.country {
        session.set_country_id(country);
    }

    let formatter = session.currency_formatter();
    let packages: Vec<PackageRow> = session
        .package_options()
        .into_iter()
        .map(|option| {
            let add_price = formatter.format(option.add_price);
            let percent = format_percent(option.package.loading_ratio);
            PackageRow {
                label: format!("{} (+{add_price}, {percent})", option.package.name),
                id: option.package.id.to_string(),
                name: option.package.name,
                loading_ratio: percent,
                add_price,
            }
        })
        .collect();

    let report = PackagesReport {
        age: session.age(),
        country: session.country().name.clone(),
        standard_premium: formatter.format(session.standard_premium()),
        packages,
    };
    let message = format!("{} packages available", report.packages.len());
    CommandResult::success_with_data(COMMAND, message, Some(report))
}
