//! Authentication
//!
//! `middleware::handler` resolves the bearer token into an [`Actor`] and
//! [`RequireCapability`] gates a router on one of the actor's capabilities.
//! Routers compose the two explicitly.
//!
//! [`Actor`]: redeem_app::auth::Actor

mod capability;
pub(crate) mod middleware;

pub(crate) use capability::RequireCapability;
