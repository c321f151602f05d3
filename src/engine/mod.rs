mod helpers;
mod matching_api;
mod notification_api;
mod rating_api;
mod request_api;
mod ride_api;
mod wallet_api;

use std::sync::Arc;

use oso::Oso;
use uuid::Uuid;

use crate::{
    api::API,
    auth::authorizor,
    config::EngineConfig,
    db::Store,
    entities::NotificationKind,
    error::Error,
    notifications::{NotificationSink, StoreSink},
};

/// Ride matching and lifecycle engine.
///
/// Every operation authorizes the caller against the oso policy, applies the
/// transition to an in-memory copy and then commits it through a guarded
/// store write. Notifications go out only after the write has landed.
pub struct Engine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn NotificationSink>,
    authorizor: Oso,
    config: EngineConfig,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            store,
            notifier,
            authorizor: authorizor::new()?,
            config,
        })
    }

    /// Engine whose notifications are recorded in `store` itself.
    pub fn with_store(store: Arc<dyn Store>, config: EngineConfig) -> Result<Self, Error> {
        let notifier = Arc::new(StoreSink::new(store.clone()));

        Self::new(store, notifier, config)
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(Error::unauthorized_error())
    }

    /// Best effort. The transition that triggered the message is already
    /// committed, so a failure is only logged.
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: NotificationKind,
        reference_id: Uuid,
    ) {
        let result = self
            .notifier
            .notify(user_id, title, message, kind, reference_id)
            .await;

        if let Err(err) = result {
            tracing::warn!(
                %user_id,
                %reference_id,
                kind = kind.name(),
                error = %err,
                "failed to deliver notification"
            );
        }
    }
}

impl API for Engine {}
