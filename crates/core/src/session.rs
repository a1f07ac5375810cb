//! A single wizard session: user input, current step and everything derived
//! from them.
//!
//! Derived values (`country`, `premium`, `currency_formatter`, ...) are
//! recomputed from the current fields on every call, so callers never have
//! to invalidate anything after a setter.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::config::WizardConfig;
use crate::domain::country::{Country, CountryId};
use crate::domain::package::{Package, PackageId};
use crate::domain::quote::{PackageOption, QuoteSummary};
use crate::domain::session::SessionId;
use crate::errors::DomainError;
use crate::flows::{
    QuoteWizard, TransitionOutcome, WizardAction, WizardContext, WizardEngine, WizardEvent,
    WizardPolicy, WizardStep, WizardTransitionError,
};
use crate::pricing::{
    self, catalog::ReferenceCatalog, currency::CurrencyFormatter, PricingResult,
};
use crate::purchase::{PurchaseGateway, PurchaseReceipt, StubPurchaseGateway};

pub const DEFAULT_AGE: u32 = 50;

/// Field values a session starts with and returns to on reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionDefaults {
    pub name: String,
    pub age: u32,
    pub country_id: CountryId,
    pub package_id: PackageId,
}

impl SessionDefaults {
    pub fn for_catalog(catalog: &ReferenceCatalog) -> Self {
        Self {
            name: String::new(),
            age: DEFAULT_AGE,
            country_id: catalog.default_country().id.clone(),
            package_id: catalog.default_package().id.clone(),
        }
    }

    pub fn from_config(config: &WizardConfig, catalog: &ReferenceCatalog) -> Self {
        let fallback = Self::for_catalog(catalog);
        Self {
            name: String::new(),
            age: config.default_age,
            country_id: config.default_country.clone().map(CountryId).unwrap_or(fallback.country_id),
            package_id: config.default_package.clone().map(PackageId).unwrap_or(fallback.package_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseConfirmation {
    pub transition: TransitionOutcome,
    pub receipt: PurchaseReceipt,
}

pub struct QuoteSession {
    id: SessionId,
    catalog: Arc<ReferenceCatalog>,
    engine: WizardEngine<QuoteWizard>,
    defaults: SessionDefaults,
    gateway: Arc<dyn PurchaseGateway>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    name: String,
    age: u32,
    country_id: CountryId,
    package_id: PackageId,
    step: WizardStep,
}

impl QuoteSession {
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        let defaults = SessionDefaults::for_catalog(&catalog);
        let engine = WizardEngine::default();
        Self {
            id: SessionId::generate(),
            step: engine.initial_step(),
            name: defaults.name.clone(),
            age: defaults.age,
            country_id: defaults.country_id.clone(),
            package_id: defaults.package_id.clone(),
            catalog,
            engine,
            defaults,
            gateway: Arc::new(StubPurchaseGateway),
            audit_sink: None,
        }
    }

    pub fn from_config(config: &WizardConfig, catalog: Arc<ReferenceCatalog>) -> Self {
        let defaults = SessionDefaults::from_config(config, &catalog);
        Self::new(catalog).with_policy(config.policy()).with_defaults(defaults)
    }

    pub fn with_policy(mut self, policy: WizardPolicy) -> Self {
        self.engine = WizardEngine::new(QuoteWizard::new(policy));
        self
    }

    /// Replaces the reset values and moves every field to them.
    pub fn with_defaults(mut self, defaults: SessionDefaults) -> Self {
        self.defaults = defaults;
        self.reset_fields();
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PurchaseGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &WizardPolicy {
        self.engine.policy()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn country_id(&self) -> &CountryId {
        &self.country_id
    }

    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub fn set_country_id(&mut self, id: impl Into<CountryId>) {
        self.country_id = id.into();
    }

    pub fn set_package_id(&mut self, id: impl Into<PackageId>) {
        self.package_id = id.into();
    }

    pub fn country(&self) -> &Country {
        self.catalog.country_or_default(&self.country_id)
    }

    pub fn package(&self) -> &Package {
        self.catalog.package_or_default(&self.package_id)
    }

    pub fn standard_premium(&self) -> Decimal {
        pricing::standard_premium(self.age, self.country())
    }

    pub fn package_options(&self) -> Vec<PackageOption> {
        pricing::package_options(self.standard_premium(), self.catalog.packages())
    }

    pub fn premium(&self) -> Decimal {
        pricing::premium(self.standard_premium(), self.package())
    }

    pub fn currency_formatter(&self) -> CurrencyFormatter {
        CurrencyFormatter::new(self.country().currency_code.as_str())
    }

    pub fn pricing(&self) -> PricingResult {
        pricing::price_with_trace(self.age, self.country(), self.package())
    }

    pub fn quote(&self) -> QuoteSummary {
        let premium = self.premium();
        QuoteSummary {
            session_id: self.id,
            name: self.name.clone(),
            age: self.age,
            country_id: self.country_id.clone(),
            country: self.country().clone(),
            package_id: self.package_id.clone(),
            package: self.package().clone(),
            standard_premium: self.standard_premium(),
            premium,
            formatted_premium: self.currency_formatter().format(premium),
        }
    }

    pub fn go_next(&mut self) -> Result<TransitionOutcome, WizardTransitionError> {
        self.transition(WizardEvent::GoNext)
    }

    pub fn go_back(&mut self) -> Result<TransitionOutcome, WizardTransitionError> {
        self.transition(WizardEvent::GoBack)
    }

    /// Leaves the details page: to the summary, or to the age rejection page
    /// when the age is over the policy limit.
    pub fn submit(&mut self) -> Result<TransitionOutcome, WizardTransitionError> {
        self.transition(WizardEvent::Submit)
    }

    pub fn restart(&mut self) -> Result<TransitionOutcome, WizardTransitionError> {
        self.transition(WizardEvent::Restart)
    }

    /// Sends the current quote to the purchase gateway. The session only
    /// resets once the gateway confirms; on failure it stays on the summary.
    pub fn buy(&mut self) -> Result<PurchaseConfirmation, DomainError> {
        let context = self.context();
        let transition = match self.engine.apply(self.step, WizardEvent::Buy, &context) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.log_rejection(&error);
                self.emit_audit(
                    "wizard.transition_rejected",
                    AuditCategory::Navigation,
                    AuditOutcome::Rejected,
                    &[("error", error.to_string())],
                );
                return Err(error.into());
            }
        };

        let quote = self.quote();
        match self.gateway.purchase(&quote) {
            Ok(receipt) => {
                info!(
                    event_name = "wizard.purchase_confirmed",
                    session_id = %self.id,
                    reference = %receipt.reference,
                    premium = %receipt.premium,
                    currency = %receipt.currency_code,
                    "purchase confirmed"
                );
                self.emit_audit(
                    "wizard.purchase_confirmed",
                    AuditCategory::Purchase,
                    AuditOutcome::Success,
                    &[
                        ("reference", receipt.reference.to_string()),
                        ("premium", receipt.premium.to_string()),
                    ],
                );
                if let Some(sink) = &self.audit_sink {
                    sink.emit(self.audit_context().transition_applied(&transition));
                }
                self.commit(&transition);
                Ok(PurchaseConfirmation { transition, receipt })
            }
            Err(error) => {
                warn!(
                    event_name = "wizard.purchase_failed",
                    session_id = %self.id,
                    error = %error,
                    "purchase failed; staying on summary"
                );
                self.emit_audit(
                    "wizard.purchase_failed",
                    AuditCategory::Purchase,
                    AuditOutcome::Failed,
                    &[("error", error.to_string())],
                );
                Err(error.into())
            }
        }
    }

    /// Puts the session on the step named by `code`, e.g. when resuming from
    /// a stored page code. Unknown codes land on [`WizardStep::NotFound`].
    pub fn restore_step(&mut self, code: &str) -> WizardStep {
        let step = WizardStep::from_page_code(code);
        if step == WizardStep::NotFound {
            warn!(
                event_name = "wizard.step_unknown",
                session_id = %self.id,
                page_code = code,
                "restored an unknown page code"
            );
        }
        self.step = step;
        step
    }

    fn context(&self) -> WizardContext {
        WizardContext {
            age: self.age,
            missing_required_fields: self.engine.policy().missing_required_fields(&self.name),
        }
    }

    fn audit_context(&self) -> AuditContext {
        AuditContext::new(self.id, self.id.to_string(), "quote-session")
    }

    fn transition(&mut self, event: WizardEvent) -> Result<TransitionOutcome, WizardTransitionError> {
        let context = self.context();
        let result = match &self.audit_sink {
            Some(sink) => self.engine.apply_with_audit(
                self.step,
                event,
                &context,
                sink.as_ref(),
                &self.audit_context(),
            ),
            None => self.engine.apply(self.step, event, &context),
        };

        match result {
            Ok(outcome) => {
                self.commit(&outcome);
                Ok(outcome)
            }
            Err(error) => {
                self.log_rejection(&error);
                Err(error)
            }
        }
    }

    fn commit(&mut self, outcome: &TransitionOutcome) {
        for action in &outcome.actions {
            match action {
                WizardAction::PriceQuote => self.record_priced_quote(),
                WizardAction::ResetFields => self.reset_fields(),
                // The gateway has already confirmed by the time a buy commits.
                WizardAction::SubmitPurchase => {}
            }
        }
        self.step = outcome.to;
        info!(
            event_name = "wizard.transition_applied",
            session_id = %self.id,
            from = %outcome.from,
            to = %outcome.to,
            event = %outcome.event,
            "wizard transition applied"
        );
    }

    fn record_priced_quote(&self) {
        let pricing = self.pricing();
        debug!(
            event_name = "wizard.quote_priced",
            session_id = %self.id,
            standard_premium = %pricing.standard_premium,
            premium = %pricing.premium,
            currency = %pricing.currency,
            "quote priced"
        );
        self.emit_audit(
            "wizard.quote_priced",
            AuditCategory::Pricing,
            AuditOutcome::Success,
            &[("premium", pricing.premium.to_string()), ("currency", pricing.currency)],
        );
    }

    fn reset_fields(&mut self) {
        self.name = self.defaults.name.clone();
        self.age = self.defaults.age;
        self.country_id = self.defaults.country_id.clone();
        self.package_id = self.defaults.package_id.clone();
    }

    fn log_rejection(&self, error: &WizardTransitionError) {
        warn!(
            event_name = "wizard.transition_rejected",
            session_id = %self.id,
            step = %self.step,
            error = %error,
            "wizard transition rejected"
        );
    }

    fn emit_audit(
        &self,
        event_type: &str,
        category: AuditCategory,
        outcome: AuditOutcome,
        metadata: &[(&str, String)],
    ) {
        let Some(sink) = &self.audit_sink else {
            return;
        };
        let event = metadata.iter().fold(
            self.audit_context().event(event_type, category, outcome),
            |event, (key, value)| event.with_metadata(*key, value.clone()),
        );
        sink.emit(event);
    }
}
