//! Coupon Codes

use std::fmt;

use thiserror::Error;

/// Longest accepted coupon code, in characters.
pub const MAX_CODE_LENGTH: usize = 64;

/// Reasons a coupon code is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponCodeError {
    /// The code is empty.
    #[error("coupon code must not be empty")]
    Empty,

    /// The code starts or ends with whitespace.
    #[error("coupon code must not start or end with whitespace")]
    SurroundingWhitespace,

    /// The code is longer than [`MAX_CODE_LENGTH`].
    #[error("coupon code must be at most {MAX_CODE_LENGTH} characters, got {0}")]
    TooLong(usize),
}

/// A validated, case-sensitive coupon code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CouponCode(String);

impl CouponCode {
    /// Validate a code.
    ///
    /// # Errors
    ///
    /// Returns [`CouponCodeError`] if the code is empty, padded or too long.
    pub fn parse(code: impl Into<String>) -> Result<Self, CouponCodeError> {
        let code = code.into();

        if code.is_empty() {
            return Err(CouponCodeError::Empty);
        }

        if code.trim() != code {
            return Err(CouponCodeError::SurroundingWhitespace);
        }

        let length = code.chars().count();

        if length > MAX_CODE_LENGTH {
            return Err(CouponCodeError::TooLong(length));
        }

        Ok(Self(code))
    }

    /// The code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CouponCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
