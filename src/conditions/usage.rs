//! Usage Conditions

/// Usage caps stored with the coupon. Redemption counting happens at checkout,
/// which is outside this crate; the caps are carried so they round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageConditions {
    /// Global cap across all customers.
    pub max_total_uses: Option<u32>,

    /// Whether each customer may redeem the coupon only once.
    pub one_use_per_customer: bool,
}
