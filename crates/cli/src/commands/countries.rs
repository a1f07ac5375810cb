use coverquote_core::config::LoadOptions;
use serde::Serialize;

use crate::commands::{load_runtime, CommandResult};

const COMMAND: &str = "countries";

#[derive(Debug, Serialize)]
struct CountryRow {
    id: String,
    name: String,
    currency_code: String,
    rate: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let runtime = match load_runtime(COMMAND, options) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let countries: Vec<CountryRow> = runtime
        .catalog
        .countries()
        .iter()
        .map(|country| CountryRow {
            id: country.id.to_string(),
            name: country.name.clone(),
            currency_code: country.currency_code.clone(),
            rate: country.rate.to_string(),
        })
        .collect();

    let message = format!("{} countries available", countries.len());
    CommandResult::success_with_data(COMMAND, message, Some(countries))
}
