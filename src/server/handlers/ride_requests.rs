use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::NewRideRequest;
use crate::auth::User;
use crate::entities::{Ride, RideRequest};
use crate::error::Error;
use crate::server::DynAPI;

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<NewRideRequest>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.create_request(user, params).await?;

    Ok(request.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<RideRequest>>, Error> {
    let requests = api.list_requests(user).await?;

    Ok(requests.into())
}

pub async fn list_open(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<RideRequest>>, Error> {
    let requests = api.list_open_requests(user).await?;

    Ok(requests.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.find_request(user, id).await?;

    Ok(request.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.cancel_request(user, id).await?;

    Ok(request.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.accept_request(user, id).await?;

    Ok(ride.into())
}
