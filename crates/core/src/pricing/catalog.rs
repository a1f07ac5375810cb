use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::country::{Country, CountryId};
use crate::domain::package::{Package, PackageId};

/// Largest accepted country rate multiplier.
pub const MAX_RATE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Largest accepted package loading ratio (10000%).
///
/// Together with [`MAX_RATE`] this keeps `10 * u32::MAX * rate * (1 + ratio)`
/// well inside `Decimal` range, so pricing never overflows for any age.
pub const MAX_LOADING_RATIO: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reference catalog has no {0}; at least one entry is required")]
    Empty(&'static str),
    #[error("duplicate {kind} id `{id}` in reference catalog")]
    DuplicateId { kind: &'static str, id: String },
    #[error("country `{id}` has a negative rate multiplier ({rate})")]
    NegativeRate { id: String, rate: Decimal },
    #[error("package `{id}` has a negative loading ratio ({ratio})")]
    NegativeLoading { id: String, ratio: Decimal },
    #[error("country `{id}` rate multiplier {rate} is above the limit of {}", MAX_RATE)]
    RateTooLarge { id: String, rate: Decimal },
    #[error("package `{id}` loading ratio {ratio} is above the limit of {}", MAX_LOADING_RATIO)]
    LoadingTooLarge { id: String, ratio: Decimal },
    #[error("could not read reference data `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse reference data `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
}

/// Immutable lookup tables for countries and coverage packages.
///
/// Both lists are non-empty and kept in declaration order. Lookups of an
/// unknown id resolve to the first entry of the relevant list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceCatalog {
    countries: Vec<Country>,
    packages: Vec<Package>,
}

impl ReferenceCatalog {
    pub fn new(countries: Vec<Country>, packages: Vec<Package>) -> Result<Self, CatalogError> {
        if countries.is_empty() {
            return Err(CatalogError::Empty("countries"));
        }
        if packages.is_empty() {
            return Err(CatalogError::Empty("packages"));
        }

        let mut seen = HashSet::new();
        for country in &countries {
            if !seen.insert(country.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "country",
                    id: country.id.0.clone(),
                });
            }
            if country.rate.is_sign_negative() && !country.rate.is_zero() {
                return Err(CatalogError::NegativeRate {
                    id: country.id.0.clone(),
                    rate: country.rate,
                });
            }
            if country.rate > MAX_RATE {
                return Err(CatalogError::RateTooLarge {
                    id: country.id.0.clone(),
                    rate: country.rate,
                });
            }
        }

        let mut seen = HashSet::new();
        for package in &packages {
            if !seen.insert(package.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "package",
                    id: package.id.0.clone(),
                });
            }
            if package.loading_ratio.is_sign_negative() && !package.loading_ratio.is_zero() {
                return Err(CatalogError::NegativeLoading {
                    id: package.id.0.clone(),
                    ratio: package.loading_ratio,
                });
            }
            if package.loading_ratio > MAX_LOADING_RATIO {
                return Err(CatalogError::LoadingTooLarge {
                    id: package.id.0.clone(),
                    ratio: package.loading_ratio,
                });
            }
        }

        Ok(Self { countries, packages })
    }

    pub fn builtin() -> Self {
        Self {
            countries: vec![
                country("HKD", "Hong Kong", "HKD", Decimal::ONE),
                country("USD", "USA", "USD", Decimal::from(2)),
                country("AUD", "Australia", "AUD", Decimal::from(3)),
            ],
            packages: vec![
                package("sd", "Standard", Decimal::ZERO),
                package("sf", "Safe", Decimal::new(5, 1)),
                package("ss", "Super Safe", Decimal::new(75, 2)),
            ],
        }
    }

    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, CatalogError> {
        let file = toml::from_str::<CatalogFile>(raw)
            .map_err(|source| CatalogError::ParseFile { path: origin.to_path_buf(), source })?;

        let countries = file
            .countries
            .into_iter()
            .map(|entry| Country {
                currency_code: entry.currency_code.unwrap_or_else(|| entry.id.clone()),
                id: CountryId(entry.id),
                name: entry.name,
                rate: entry.rate,
            })
            .collect();
        let packages = file
            .packages
            .into_iter()
            .map(|entry| Package {
                id: PackageId(entry.id),
                name: entry.name,
                loading_ratio: entry.loading_ratio,
            })
            .collect();

        Self::new(countries, packages)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw, path)
    }

    /// Loads from `path` when given, otherwise returns the built-in tables.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn default_country(&self) -> &Country {
        &self.countries[0]
    }

    pub fn default_package(&self) -> &Package {
        &self.packages[0]
    }

    pub fn find_country(&self, id: &CountryId) -> Option<&Country> {
        self.countries.iter().find(|country| &country.id == id)
    }

    pub fn find_package(&self, id: &PackageId) -> Option<&Package> {
        self.packages.iter().find(|package| &package.id == id)
    }

    pub fn country_or_default(&self, id: &CountryId) -> &Country {
        self.find_country(id).unwrap_or_else(|| self.default_country())
    }

    pub fn package_or_default(&self, id: &PackageId) -> &Package {
        self.find_package(id).unwrap_or_else(|| self.default_package())
    }
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn country(id: &str, name: &str, currency_code: &str, rate: Decimal) -> Country {
    Country {
        id: CountryId(id.to_owned()),
        name: name.to_owned(),
        currency_code: currency_code.to_owned(),
        rate,
    }
}

fn package(id: &str, name: &str, loading_ratio: Decimal) -> Package {
    Package { id: PackageId(id.to_owned()), name: name.to_owned(), loading_ratio }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    countries: Vec<CountryEntry>,
    #[serde(default)]
    packages: Vec<PackageEntry>,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    id: String,
    name: String,
    currency_code: Option<String>,
    rate: Decimal,
}

#[derive(Debug, Deserialize)]
struct PackageEntry {
    id: String,
    name: String,
    loading_ratio: Decimal,
}
