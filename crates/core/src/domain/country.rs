use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryId(pub String);

impl CountryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CountryId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for CountryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A country of residence and the rate multiplier applied to its premiums.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub currency_code: String,
    pub rate: Decimal,
}
