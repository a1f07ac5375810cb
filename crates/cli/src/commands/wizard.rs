//! Line-oriented front end for a [`QuoteSession`]: one page rendered per
//! step, one command per input line.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use coverquote_core::audit::InMemoryAuditSink;
use coverquote_core::config::LoadOptions;
use coverquote_core::{format_percent, QuoteSession, WizardStep};
use rust_decimal::Decimal;

use crate::commands::{load_runtime, CommandResult};

const COMMAND: &str = "wizard";

const HELP: &str = "commands: start | name <text> | age <years> | country <id> | package <id> \
                    | next | back | buy | ok | restart | help | quit";

pub fn run(options: LoadOptions) -> CommandResult {
    let runtime = match load_runtime(COMMAND, options) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let audit = InMemoryAuditSink::default();
    let mut session = QuoteSession::from_config(&runtime.config.wizard, runtime.catalog)
        .with_audit_sink(Arc::new(audit.clone()));
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    match run_with_io(&mut session, stdin.lock(), &mut stdout) {
        Ok(()) => CommandResult::success_with_data(
            COMMAND,
            format!("session {} ended", session.id()),
            Some(serde_json::json!({ "audit_trail": audit.event_types() })),
        ),
        Err(error) => CommandResult::failure(COMMAND, "io", format!("{error:#}"), 1),
    }
}

/// Drives `session` from `input` until `quit` or end of input.
pub fn run_with_io<R, W>(session: &mut QuoteSession, input: R, output: &mut W) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
{
    render(session, output)?;

    for line in input.lines() {
        let line = line.context("failed to read wizard input")?;
        let (command, argument) = match line.trim().split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line.trim(), ""),
        };

        let command = command.to_ascii_lowercase();
        match command.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => writeln!(output, "{HELP}")?,
            "name" | "age" | "country" | "package" => {
                match set_field(session, &command, argument) {
                    Ok(()) => render(session, output)?,
                    Err(message) => writeln!(output, "! {message}")?,
                }
            }
            "start" => navigate(session, output, QuoteSession::go_next)?,
            "next" | "submit" => {
                if session.step() == WizardStep::Details {
                    navigate(session, output, QuoteSession::submit)?;
                } else {
                    navigate(session, output, QuoteSession::go_next)?;
                }
            }
            "back" => navigate(session, output, QuoteSession::go_back)?,
            "ok" | "restart" => navigate(session, output, QuoteSession::restart)?,
            "buy" => match session.buy() {
                Ok(confirmation) => {
                    writeln!(
                        output,
                        "Thank you! Your purchase reference is {}.",
                        confirmation.receipt.reference
                    )?;
                    render(session, output)?;
                }
                Err(error) => writeln!(output, "! {error}")?,
            },
            other => writeln!(output, "! unknown command `{other}`; type `help`")?,
        }
    }

    output.flush().context("failed to flush wizard output")
}

fn navigate<W, T, E>(
    session: &mut QuoteSession,
    output: &mut W,
    step: impl FnOnce(&mut QuoteSession) -> Result<T, E>,
) -> io::Result<()>
where
    W: Write,
    E: std::fmt::Display,
{
    match step(session) {
        Ok(_) => render(session, output),
        Err(error) => writeln!(output, "! {error}"),
    }
}

fn set_field(session: &mut QuoteSession, field: &str, value: &str) -> Result<(), String> {
    if session.step() != WizardStep::Details {
        return Err("fields can only be changed on the details page".to_string());
    }

    match field {
        "name" => session.set_name(value),
        "age" => {
            let age = value
                .parse::<u32>()
                .map_err(|_| format!("age must be a whole number of years, got `{value}`"))?;
            session.set_age(age);
        }
        "country" => session.set_country_id(value),
        _ => session.set_package_id(value),
    }
    Ok(())
}

fn render<W: Write>(session: &QuoteSession, output: &mut W) -> io::Result<()> {
    let step = session.step();
    writeln!(output)?;
    writeln!(output, "== {} ==", step.title())?;

    match step {
        WizardStep::Intro => {
            writeln!(output, "Let's buy some insurance. It is going to take only a few steps.")?;
            writeln!(output, "Type `start` to begin.")?;
        }
        WizardStep::Details => render_details(session, output)?,
        WizardStep::AgeRejected => {
            writeln!(output, "Your age is over our accepted limit.")?;
            writeln!(output, "We are sorry but we cannot insure you now")?;
            writeln!(output, "Type `ok` to start over.")?;
        }
        WizardStep::Summary => {
            let quote = session.quote();
            writeln!(output, "Name: {}", quote.name)?;
            writeln!(output, "Age: {}", quote.age)?;
            writeln!(output, "Where do you live: {}", quote.country.name)?;
            writeln!(output, "Package: {}", quote.package.name)?;
            writeln!(output, "Premium: {}", quote.formatted_premium)?;
            writeln!(output, "Type `buy` to purchase or `back` to change your details.")?;
        }
        WizardStep::NotFound => {
            writeln!(output, "Something went wrong.")?;
            writeln!(output, "Type `restart` to start over.")?;
        }
    }
    Ok(())
}

fn render_details<W: Write>(session: &QuoteSession, output: &mut W) -> io::Result<()> {
    let formatter = session.currency_formatter();

    writeln!(output, "Name: {}", session.name())?;
    writeln!(output, "Age: {}", session.age())?;

    let countries = session
        .catalog()
        .countries()
        .iter()
        .map(|country| {
            let marker = if country.id == session.country().id { "*" } else { " " };
            format!("  {marker} {} ({})", country.name, country.id)
        })
        .collect::<Vec<_>>();
    writeln!(output, "Where do you live:")?;
    for row in countries {
        writeln!(output, "{row}")?;
    }

    writeln!(output, "Package:")?;
    let selected = session.package().id.clone();
    for option in session.package_options() {
        let marker = if option.package.id == selected { "*" } else { " " };
        let label = if option.add_price <= Decimal::ZERO {
            option.package.name.clone()
        } else {
            format!(
                "{} (+{}, {})",
                option.package.name,
                formatter.format(option.add_price),
                format_percent(option.package.loading_ratio)
            )
        };
        writeln!(output, "  {marker} {label} ({})", option.package.id)?;
    }

    writeln!(output, "Your premium is: {}", formatter.format(session.premium()))?;
    writeln!(output, "Type `next` to see the summary or `back` to return.")
}
