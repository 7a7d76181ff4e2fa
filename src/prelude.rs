//! Redeem prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::Cart,
    conditions::{
        ConditionKind, CustomerConditions, CustomerGroup, Operator, OrderCondition,
        OrderConditions, Predicate, PredicateError, PredicateParts, TargetVariants,
        UsageConditions,
    },
    coupons::{
        Coupon, CouponCode, CouponCodeError, CouponId, CouponType, InvertedWindow,
        ValidityWindow, WindowPosition,
    },
    discounts::{
        AdjustedCart, AdjustedLine, BuyGroup, BuyXGetY, BuyXGetYError, Discount, DiscountError,
        DiscountType, GetGroup, Minimum, apply_buy_x_get_y, calculate_discounted_price,
    },
    eligibility::{
        Customer, Eligibility, Ineligibility, applicable_coupons, evaluate, evaluate_for_cart,
    },
    idset::IdSet,
    items::{EntityKind, LineItem},
    pricing::{Percent, PercentError, round_price},
};
