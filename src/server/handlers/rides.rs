use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Coordinates, Rating, Ride, RideStatus, RideView};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct OtpParams {
    otp: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatusParams {
    status: RideStatus,
    #[serde(default)]
    location: Option<Coordinates>,
}

#[derive(Serialize, Deserialize)]
pub struct RatingParams {
    rating: i16,
    #[serde(default)]
    comment: Option<String>,
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.list_rides(user).await?;

    Ok(rides.into())
}

pub async fn current(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Option<Ride>>, Error> {
    let ride = api.get_current_ride(user).await?;

    Ok(ride.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<RideView>, Error> {
    let view = api.find_ride(user, id).await?;

    Ok(view.into())
}

pub async fn submit_otp(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<OtpParams>,
) -> Result<Json<Ride>, Error> {
    let ride = api.submit_otp(user, id, params.otp).await?;

    Ok(ride.into())
}

pub async fn advance_status(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<StatusParams>,
) -> Result<Json<Ride>, Error> {
    let ride = api
        .advance_status(user, id, params.status, params.location)
        .await?;

    Ok(ride.into())
}

pub async fn update_location(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(location): Json<Coordinates>,
) -> Result<Json<Ride>, Error> {
    let ride = api.update_driver_location(user, id, location).await?;

    Ok(ride.into())
}

pub async fn rate(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<RatingParams>,
) -> Result<Json<Rating>, Error> {
    let rating = api
        .rate_ride(user, id, params.rating, params.comment)
        .await?;

    Ok(rating.into())
}

pub async fn find_rating(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<Rating>>, Error> {
    let rating = api.find_rating(user, id).await?;

    Ok(rating.into())
}
