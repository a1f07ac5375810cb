pub mod engine;
pub mod states;

pub use engine::{QuoteWizard, WizardDefinition, WizardEngine, WizardPolicy, WizardTransitionError};
pub use states::{TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardStep};
