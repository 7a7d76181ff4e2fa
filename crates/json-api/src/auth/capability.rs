//! Capability gate.

use redeem_app::auth::Capability;
use salvo::prelude::*;
use tracing::info;

use crate::extensions::*;

/// Rejects actors that lack the capability. Must run after the auth middleware.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequireCapability(pub(crate) Capability);

#[handler]
impl RequireCapability {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let actor = match depot.actor_or_401() {
            Ok(actor) => actor,
            Err(status) => {
                res.render(status);

                return;
            }
        };

        if !actor.can(self.0) {
            info!(
                actor = %actor.name,
                capability = %self.0,
                "actor lacks required capability"
            );

            res.render(
                StatusError::forbidden().brief(format!("Token lacks the {} capability", self.0)),
            );

            return;
        }

        ctrl.call_next(req, depot, res).await;
    }
}
