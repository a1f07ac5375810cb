pub mod catalog;
pub mod currency;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::country::Country;
use crate::domain::package::Package;
use crate::domain::quote::PackageOption;

/// Premium charged per year of age before the country multiplier.
pub const BASE_RATE_PER_YEAR: Decimal = Decimal::TEN;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub standard_premium: Decimal,
    pub package_loading: Decimal,
    pub premium: Decimal,
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

pub fn standard_premium(age: u32, country: &Country) -> Decimal {
    BASE_RATE_PER_YEAR * Decimal::from(age) * country.rate
}

pub fn premium(standard_premium: Decimal, package: &Package) -> Decimal {
    standard_premium * (Decimal::ONE + package.loading_ratio)
}

pub fn package_options(standard_premium: Decimal, packages: &[Package]) -> Vec<PackageOption> {
    packages
        .iter()
        .map(|package| PackageOption {
            package: package.clone(),
            add_price: standard_premium * package.loading_ratio,
        })
        .collect()
}

pub fn price_with_trace(age: u32, country: &Country, package: &Package) -> PricingResult {
    let standard = standard_premium(age, country);
    let total = premium(standard, package);
    let package_loading = total - standard;

    PricingResult {
        standard_premium: standard,
        package_loading,
        premium: total,
        currency: country.currency_code.clone(),
        steps: vec![
            PricingTraceStep {
                stage: "standard_premium".to_string(),
                detail: format!("{BASE_RATE_PER_YEAR} * age({age}) * rate({})", country.rate),
                amount: standard,
            },
            PricingTraceStep {
                stage: "package_loading".to_string(),
                detail: format!(
                    "standard_premium * loading_ratio({}) for package `{}`",
                    package.loading_ratio, package.id
                ),
                amount: package_loading,
            },
            PricingTraceStep {
                stage: "premium".to_string(),
                detail: "standard_premium + package_loading".to_string(),
                amount: total,
            },
        ],
    }
}
