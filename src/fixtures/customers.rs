//! Customer Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    conditions::CustomerGroup,
    eligibility::Customer,
    fixtures::{FixtureError, parse_decimal},
};

/// Wrapper for customers in YAML
#[derive(Debug, Deserialize)]
pub struct CustomersFixture {
    /// Map of customer key -> customer fixture
    pub customers: FxHashMap<String, CustomerFixture>,
}

/// Customer Fixture
#[derive(Debug, Deserialize)]
pub struct CustomerFixture {
    /// Email address
    #[serde(default)]
    pub email: Option<String>,

    /// Tier names
    #[serde(default)]
    pub groups: Vec<String>,

    /// Historical purchase total (e.g., "250.00")
    #[serde(default)]
    pub purchased_total: Option<String>,
}

impl TryFrom<CustomerFixture> for Customer {
    type Error = FixtureError;

    fn try_from(fixture: CustomerFixture) -> Result<Self, Self::Error> {
        Ok(Customer {
            email: fixture.email,
            groups: fixture.groups.into_iter().map(CustomerGroup::new).collect(),
            purchased_total: fixture
                .purchased_total
                .as_deref()
                .map(parse_decimal)
                .transpose()?,
        })
    }
}
