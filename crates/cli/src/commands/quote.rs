use std::sync::Arc;

use coverquote_core::audit::InMemoryAuditSink;
use coverquote_core::config::LoadOptions;
use coverquote_core::pricing::PricingResult;
use coverquote_core::{
    ApplicationError, DomainError, PurchaseReceipt, QuoteSession, QuoteSummary, WizardStep,
    WizardTransitionError,
};
use serde::Serialize;

use crate::commands::{load_runtime, CommandResult};

const COMMAND: &str = "quote";

#[derive(Clone, Debug, Default)]
pub struct QuoteArgs {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub country: Option<String>,
    pub package: Option<String>,
    pub buy: bool,
}

#[derive(Debug, Serialize)]
struct QuoteReport {
    step: WizardStep,
    quote: QuoteSummary,
    pricing: PricingResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    purchase: Option<PurchaseReceipt>,
    audit_trail: Vec<String>,
}

/// Walks a fresh session intro -> details -> summary with the given fields,
/// optionally buying the result.
pub fn run(args: QuoteArgs, options: LoadOptions) -> CommandResult {
    let runtime = match load_runtime(COMMAND, options) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let audit = InMemoryAuditSink::default();
    let mut session = QuoteSession::from_config(&runtime.config.wizard, runtime.catalog)
        .with_audit_sink(Arc::new(audit.clone()));
    let correlation_id = session.id().to_string();

    if let Err(error) = session.go_next() {
        return transition_failure(error, &correlation_id);
    }

    if let Some(name) = args.name {
        session.set_name(name);
    }
    if let Some(age) = args.age {
        session.set_age(age);
    }
    if let Some(country) = args.country {
        session.set_country_id(country);
    }
    if let Some(package) = args.package {
        session.set_package_id(package);
    }

    if let Err(error) = session.submit() {
        return transition_failure(error, &correlation_id);
    }

    if session.step() == WizardStep::AgeRejected {
        return CommandResult::failure(
            COMMAND,
            "age_rejected",
            format!(
                "age {} is over the accepted limit of {}",
                session.age(),
                session.policy().max_age
            ),
            3,
        );
    }

    let quote = session.quote();
    let pricing = session.pricing();

    let purchase = if args.buy {
        match session.buy() {
            Ok(confirmation) => Some(confirmation.receipt),
            Err(error) => {
                return CommandResult::from_application_error(
                    COMMAND,
                    ApplicationError::Domain(error),
                    correlation_id,
                    3,
                )
            }
        }
    } else {
        None
    };

    let message = match &purchase {
        Some(receipt) => format!(
            "purchased {} cover for {} (reference {})",
            quote.package.name, quote.formatted_premium, receipt.reference
        ),
        None => format!("your premium is {}", quote.formatted_premium),
    };

    let report = QuoteReport {
        step: session.step(),
        quote,
        pricing,
        purchase,
        audit_trail: audit.event_types(),
    };
    CommandResult::success_with_data(COMMAND, message, Some(report))
}

fn transition_failure(error: WizardTransitionError, correlation_id: &str) -> CommandResult {
    CommandResult::from_application_error(
        COMMAND,
        ApplicationError::Domain(DomainError::from(error)),
        correlation_id,
        3,
    )
}
