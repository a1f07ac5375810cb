use std::fmt;

use serde::{Deserialize, Serialize};

/// The page the wizard is currently showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Intro,
    Details,
    AgeRejected,
    Summary,
    /// Reached only when a step is restored from a page code nothing maps to.
    NotFound,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Details => "details",
            Self::AgeRejected => "age_rejected",
            Self::Summary => "summary",
            Self::NotFound => "not_found",
        }
    }

    /// Legacy numeric page code: 1, 2, 2.5 and 3.
    pub fn page_code(&self) -> &'static str {
        match self {
            Self::Intro => "1",
            Self::Details => "2",
            Self::AgeRejected => "2.5",
            Self::Summary => "3",
            Self::NotFound => "404",
        }
    }

    /// Accepts either a legacy numeric page code or a step name. Anything
    /// else maps to [`WizardStep::NotFound`].
    pub fn from_page_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "1" | "intro" => Self::Intro,
            "2" | "details" => Self::Details,
            "2.5" | "age_rejected" => Self::AgeRejected,
            "3" | "summary" => Self::Summary,
            _ => Self::NotFound,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Intro => "Hello There!",
            Self::Details => "Tell us about yourself",
            Self::AgeRejected | Self::NotFound => "Ooops",
            Self::Summary => "Summary",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardEvent {
    GoNext,
    GoBack,
    Submit,
    Restart,
    Buy,
}

impl fmt::Display for WizardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GoNext => "go_next",
            Self::GoBack => "go_back",
            Self::Submit => "submit",
            Self::Restart => "restart",
            Self::Buy => "buy",
        };
        f.write_str(name)
    }
}

/// Inputs the transition table needs from the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WizardContext {
    pub age: u32,
    pub missing_required_fields: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardAction {
    PriceQuote,
    SubmitPurchase,
    ResetFields,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WizardStep,
    pub to: WizardStep,
    pub event: WizardEvent,
    pub actions: Vec<WizardAction>,
}
