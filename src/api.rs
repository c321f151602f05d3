use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{
    Coordinates, Notification, Rating, Ride, RideRequest, RideStatus, RideView, Wallet,
};
use crate::error::Error;

/// What a parent submits to ask for a ride. A missing `price` is filled in
/// with a default fare.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewRideRequest {
    pub child_id: Uuid,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_time: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<i64>,
}

#[async_trait]
pub trait RideRequestAPI {
    async fn create_request(&self, user: User, params: NewRideRequest)
        -> Result<RideRequest, Error>;

    async fn find_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error>;

    async fn list_requests(&self, user: User) -> Result<Vec<RideRequest>, Error>;

    async fn list_open_requests(&self, user: User) -> Result<Vec<RideRequest>, Error>;

    async fn cancel_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error>;
}

#[async_trait]
pub trait MatchingAPI {
    async fn accept_request(&self, user: User, request_id: Uuid) -> Result<Ride, Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn find_ride(&self, user: User, id: Uuid) -> Result<RideView, Error>;

    async fn list_rides(&self, user: User) -> Result<Vec<Ride>, Error>;

    async fn get_current_ride(&self, user: User) -> Result<Option<Ride>, Error>;

    async fn submit_otp(&self, user: User, id: Uuid, otp: String) -> Result<Ride, Error>;

    async fn advance_status(
        &self,
        user: User,
        id: Uuid,
        target: RideStatus,
        location: Option<Coordinates>,
    ) -> Result<Ride, Error>;

    async fn update_driver_location(
        &self,
        user: User,
        id: Uuid,
        location: Coordinates,
    ) -> Result<Ride, Error>;
}

#[async_trait]
pub trait RatingAPI {
    async fn rate_ride(
        &self,
        user: User,
        ride_id: Uuid,
        score: i16,
        comment: Option<String>,
    ) -> Result<Rating, Error>;

    async fn find_rating(&self, user: User, ride_id: Uuid) -> Result<Option<Rating>, Error>;
}

#[async_trait]
pub trait WalletAPI {
    async fn find_wallet(&self, user: User) -> Result<Wallet, Error>;
}

#[async_trait]
pub trait NotificationAPI {
    async fn list_notifications(&self, user: User) -> Result<Vec<Notification>, Error>;
}

pub trait API:
    RideRequestAPI + MatchingAPI + RideAPI + RatingAPI + WalletAPI + NotificationAPI
{
}
