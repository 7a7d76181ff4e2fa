//! Conditions
//!
//! Value types describing when a coupon applies: who the customer is, which
//! variants are targeted, which order lines qualify, and how often it may be used.

pub mod customer;
pub mod order;
pub mod predicates;
pub mod targets;
pub mod usage;

pub use customer::{CustomerConditions, CustomerGroup};
pub use order::{OrderCondition, OrderConditions};
pub use predicates::{ConditionKind, Operator, Predicate, PredicateError, PredicateParts};
pub use targets::TargetVariants;
pub use usage::UsageConditions;
