use super::Engine;

use async_trait::async_trait;

use crate::{api::NotificationAPI, auth::User, entities::Notification, error::Error};

#[async_trait]
impl NotificationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_notifications(&self, user: User) -> Result<Vec<Notification>, Error> {
        self.store.list_notifications(user.id).await
    }
}
