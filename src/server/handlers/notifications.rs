use axum::extract::{Extension, Json};

use crate::auth::User;
use crate::entities::Notification;
use crate::error::Error;
use crate::server::DynAPI;

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<Notification>>, Error> {
    let notifications = api.list_notifications(user).await?;

    Ok(notifications.into())
}
