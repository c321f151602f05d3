use axum::extract::{Extension, Json};

use crate::auth::User;
use crate::entities::Wallet;
use crate::error::Error;
use crate::server::DynAPI;

pub async fn find(Extension(api): Extension<DynAPI>, user: User) -> Result<Json<Wallet>, Error> {
    let wallet = api.find_wallet(user).await?;

    Ok(wallet.into())
}
