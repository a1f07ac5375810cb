use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::country::{Country, CountryId};
use crate::domain::package::{Package, PackageId};
use crate::domain::session::SessionId;

/// A catalog package paired with what it adds on top of the standard premium.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOption {
    pub package: Package,
    pub add_price: Decimal,
}

/// Snapshot of a session as shown on the summary page and handed to the
/// purchase gateway.
///
/// `country_id`/`package_id` are the raw stored ids; `country`/`package` are
/// what they resolved to, so the two can differ when an id is unknown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub session_id: SessionId,
    pub name: String,
    pub age: u32,
    pub country_id: CountryId,
    pub country: Country,
    pub package_id: PackageId,
    pub package: Package,
    pub standard_premium: Decimal,
    pub premium: Decimal,
    pub formatted_premium: String,
}
