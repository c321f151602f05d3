use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::Store;
use crate::entities::{Notification, NotificationKind};
use crate::error::Error;

/// Outbound channel for user-facing messages.
///
/// Delivery is fire-and-forget: the engine logs a failed `notify` and carries
/// on, a transition is never undone because its message did not go out.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: NotificationKind,
        reference_id: Uuid,
    ) -> Result<(), Error>;
}

/// Sink that records notifications in the store, where clients poll them
/// from `GET /notifications`.
pub struct StoreSink {
    store: Arc<dyn Store>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationSink for StoreSink {
    #[tracing::instrument(skip(self, title, message))]
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: NotificationKind,
        reference_id: Uuid,
    ) -> Result<(), Error> {
        let notification = Notification::new(user_id, title, message, kind, reference_id);

        self.store.insert_notification(&notification).await
    }
}
