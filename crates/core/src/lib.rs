pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod pricing;
pub mod purchase;
pub mod session;

pub use domain::country::{Country, CountryId};
pub use domain::package::{Package, PackageId};
pub use domain::quote::{PackageOption, QuoteSummary};
pub use domain::session::SessionId;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{
    TransitionOutcome, WizardAction, WizardEngine, WizardEvent, WizardPolicy, WizardStep,
    WizardTransitionError,
};
pub use pricing::catalog::{CatalogError, ReferenceCatalog};
pub use pricing::currency::{format_percent, CurrencyFormatter};
pub use purchase::{PurchaseError, PurchaseGateway, PurchaseReceipt, StubPurchaseGateway};
pub use session::{PurchaseConfirmation, QuoteSession, SessionDefaults};
