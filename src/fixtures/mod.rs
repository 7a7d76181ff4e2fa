//! Fixtures
//!
//! YAML fixture sets for tests and demos. A set named `storefront` lives in
//! `fixtures/coupons/storefront.yml`, `fixtures/carts/storefront.yml` and
//! `fixtures/customers/storefront.yml`.

use std::{fs, path::PathBuf};

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{cart::Cart, coupons::Coupon, eligibility::Customer, items::LineItem};

pub mod carts;
pub mod coupons;
pub mod customers;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid decimal format
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),

    /// Invalid timestamp format
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Coupon data that does not form a valid coupon
    #[error("Invalid coupon {code}: {reason}")]
    InvalidCoupon {
        /// Coupon code as written in the fixture
        code: String,

        /// What was wrong
        reason: String,
    },

    /// Coupon not found
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Cart not found
    #[error("Cart not found: {0}")]
    CartNotFound(String),

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
}

/// Parse a quoted decimal such as `"12.50"`.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidDecimal`] if the string is not a decimal.
pub fn parse_decimal(s: &str) -> Result<Decimal, FixtureError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidDecimal(s.to_string()))
}

/// Parse an RFC 3339 timestamp such as `"2026-01-01T00:00:00Z"`.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidTimestamp`] if the string is not a timestamp.
pub fn parse_timestamp(s: &str) -> Result<Timestamp, FixtureError> {
    s.parse::<Timestamp>()
        .map_err(|_err| FixtureError::InvalidTimestamp(s.to_string()))
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Coupons in file order
    coupons: Vec<Coupon>,

    /// Carts by key
    carts: FxHashMap<String, Cart>,

    /// Customers by key
    customers: FxHashMap<String, Customer>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            coupons: Vec::new(),
            carts: FxHashMap::default(),
            customers: FxHashMap::default(),
        }
    }

    fn read(&self, category: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        Ok(fs::read_to_string(&file_path)?)
    }

    /// Load coupons from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a coupon is invalid.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("coupons", name)?;
        let fixture: coupons::CouponsFixture = serde_norway::from_str(&contents)?;

        for coupon_fixture in fixture.coupons {
            self.coupons.push(Coupon::try_from(coupon_fixture)?);
        }

        Ok(self)
    }

    /// Load carts from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a price is invalid.
    pub fn load_carts(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("carts", name)?;
        let fixture: carts::CartsFixture = serde_norway::from_str(&contents)?;

        for (key, lines) in fixture.carts {
            let cart = lines
                .into_iter()
                .map(LineItem::try_from)
                .collect::<Result<Cart, FixtureError>>()?;

            self.carts.insert(key, cart);
        }

        Ok(self)
    }

    /// Load customers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a total is invalid.
    pub fn load_customers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("customers", name)?;
        let fixture: customers::CustomersFixture = serde_norway::from_str(&contents)?;

        for (key, customer_fixture) in fixture.customers {
            self.customers.insert(key, Customer::try_from(customer_fixture)?);
        }

        Ok(self)
    }

    /// Load a complete fixture set (coupons, carts and customers with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_coupons(name)?
            .load_carts(name)?
            .load_customers(name)?;

        Ok(fixture)
    }

    /// All coupons, in file order
    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Get a coupon by its code
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon is not found.
    pub fn coupon(&self, code: &str) -> Result<&Coupon, FixtureError> {
        self.coupons
            .iter()
            .find(|coupon| coupon.code.as_str() == code)
            .ok_or_else(|| FixtureError::CouponNotFound(code.to_string()))
    }

    /// Get a cart by its key
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is not found.
    pub fn cart(&self, key: &str) -> Result<&Cart, FixtureError> {
        self.carts
            .get(key)
            .ok_or_else(|| FixtureError::CartNotFound(key.to_string()))
    }

    /// Get a customer by its key
    ///
    /// # Errors
    ///
    /// Returns an error if the customer is not found.
    pub fn customer(&self, key: &str) -> Result<&Customer, FixtureError> {
        self.customers
            .get(key)
            .ok_or_else(|| FixtureError::CustomerNotFound(key.to_string()))
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
