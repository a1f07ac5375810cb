use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::flows::states::{
    TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardStep,
};

pub const DEFAULT_MAX_AGE: u32 = 100;

/// Rules applied when the details page is submitted and when the wizard resets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardPolicy {
    pub max_age: u32,
    pub require_name: bool,
    pub clear_fields_on_reset: bool,
}

impl Default for WizardPolicy {
    fn default() -> Self {
        Self { max_age: DEFAULT_MAX_AGE, require_name: true, clear_fields_on_reset: true }
    }
}

impl WizardPolicy {
    pub fn missing_required_fields(&self, name: &str) -> Vec<String> {
        if self.require_name && name.trim().is_empty() {
            vec!["name".to_owned()]
        } else {
            Vec::new()
        }
    }
}

pub trait WizardDefinition {
    fn initial_step(&self) -> WizardStep;
    fn policy(&self) -> &WizardPolicy;
    fn transition(
        &self,
        current: WizardStep,
        event: WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct QuoteWizard {
    policy: WizardPolicy,
}

impl QuoteWizard {
    pub fn new(policy: WizardPolicy) -> Self {
        Self { policy }
    }
}

impl WizardDefinition for QuoteWizard {
    fn initial_step(&self) -> WizardStep {
        WizardStep::Intro
    }

    fn policy(&self) -> &WizardPolicy {
        &self.policy
    }

    fn transition(
        &self,
        current: WizardStep,
        event: WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        transition_quote_wizard(&self.policy, current, event, context)
    }
}

pub struct WizardEngine<F = QuoteWizard> {
    wizard: F,
}

impl<F> WizardEngine<F>
where
    F: WizardDefinition,
{
    pub fn new(wizard: F) -> Self {
        Self { wizard }
    }

    pub fn initial_step(&self) -> WizardStep {
        self.wizard.initial_step()
    }

    pub fn policy(&self) -> &WizardPolicy {
        self.wizard.policy()
    }

    pub fn apply(
        &self,
        current: WizardStep,
        event: WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        self.wizard.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: WizardStep,
        event: WizardEvent,
        context: &WizardContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WizardTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        let audit_event = match &result {
            Ok(outcome) => audit.transition_applied(outcome),
            Err(error) => audit
                .event("wizard.transition_rejected", AuditCategory::Navigation, AuditOutcome::Rejected)
                .with_metadata("error", error.to_string()),
        };
        sink.emit(audit_event);
        result
    }
}

impl Default for WizardEngine<QuoteWizard> {
    fn default() -> Self {
        Self::new(QuoteWizard::default())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("missing required fields before leaving {step}: {missing_fields:?}")]
    MissingRequiredFields { step: WizardStep, missing_fields: Vec<String> },
    #[error("event {event} is not defined on step {step}")]
    InvalidTransition { step: WizardStep, event: WizardEvent },
}

fn transition_quote_wizard(
    policy: &WizardPolicy,
    current: WizardStep,
    event: WizardEvent,
    context: &WizardContext,
) -> Result<TransitionOutcome, WizardTransitionError> {
    use WizardAction::{PriceQuote, ResetFields, SubmitPurchase};
    use WizardEvent::{Buy, GoBack, GoNext, Restart, Submit};
    use WizardStep::{AgeRejected, Details, Intro, Summary};

    let reset = || if policy.clear_fields_on_reset { vec![ResetFields] } else { Vec::new() };

    let (to, actions) = match (current, event) {
        (Intro, GoNext) => (Details, vec![PriceQuote]),
        (Details, GoBack) => (Intro, Vec::new()),
        (Details, Submit) => {
            if !context.missing_required_fields.is_empty() {
                return Err(WizardTransitionError::MissingRequiredFields {
                    step: current,
                    missing_fields: context.missing_required_fields.clone(),
                });
            }
            if context.age > policy.max_age {
                (AgeRejected, Vec::new())
            } else {
                (Summary, vec![PriceQuote])
            }
        }
        (Summary, GoBack) => (Details, vec![PriceQuote]),
        (Summary, Buy) => {
            let mut actions = vec![SubmitPurchase];
            actions.extend(reset());
            (Intro, actions)
        }
        (_, Restart) => (Intro, reset()),
        _ => return Err(WizardTransitionError::InvalidTransition { step: current, event }),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}
