//! Validity Windows

use jiff::Timestamp;
use thiserror::Error;

/// The window ends before it starts.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("validity window ends ({end}) before it starts ({start})")]
pub struct InvertedWindow {
    /// Requested start.
    pub start: Timestamp,

    /// Requested end.
    pub end: Timestamp,
}

/// Where an instant falls relative to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Before `start`.
    NotStarted,

    /// Within `[start, end]`.
    Open,

    /// After `end`.
    Expired,
}

/// The inclusive period during which a coupon may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    start: Timestamp,
    end: Timestamp,
}

impl ValidityWindow {
    /// Create a window.
    ///
    /// # Errors
    ///
    /// Returns [`InvertedWindow`] when `end` precedes `start`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, InvertedWindow> {
        if end < start {
            return Err(InvertedWindow { start, end });
        }

        Ok(Self { start, end })
    }

    /// First instant of the window.
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Last instant of the window.
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Where `now` falls relative to the window. Both ends are inclusive.
    pub fn position(&self, now: Timestamp) -> WindowPosition {
        if now < self.start {
            WindowPosition::NotStarted
        } else if now > self.end {
            WindowPosition::Expired
        } else {
            WindowPosition::Open
        }
    }

    /// Whether `now` is within the window.
    pub fn contains(&self, now: Timestamp) -> bool {
        self.position(now) == WindowPosition::Open
    }
}
