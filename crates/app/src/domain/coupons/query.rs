//! Coupon Queries
//!
//! Listing parameters and the wrappers read paths return.

/// Page size when none is requested.
pub const DEFAULT_PAGE_LIMIT: u64 = 25;

/// Largest page size served.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Coupon listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponQuery {
    /// Case-sensitive substring of the code.
    pub code: Option<String>,

    /// Rows to skip.
    pub offset: u64,

    /// Requested page size.
    pub limit: Option<u64>,
}

impl CouponQuery {
    /// The page size actually served, within `[1, MAX_PAGE_LIMIT]`.
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    /// The code filter, ignoring an empty search string.
    pub fn code_filter(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.is_empty())
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Read-path result: the data that could be loaded and the error that stopped
/// the rest, if any.
#[derive(Debug)]
pub struct Loaded<T, E> {
    pub data: T,
    pub error: Option<E>,
}

impl<T, E> Loaded<T, E> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }

    /// Empty data carrying the failure.
    pub fn failed(error: E) -> Self
    where
        T: Default,
    {
        Self {
            data: T::default(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// # Errors
    ///
    /// Returns the carried error, dropping the partial data.
    pub fn into_result(self) -> Result<T, E> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

impl<T: Default, E> From<Result<T, E>> for Loaded<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::failed(error),
        }
    }
}
