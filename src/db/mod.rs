//! Persistence for requests, rides and their side-effect records.
//!
//! Every write that moves a ride or a request between states is guarded on the
//! status the caller last observed: the write only lands if the stored status
//! is still `expected`, and the returned `bool` says whether it did. Callers
//! turn a `false` into a conflict instead of retrying.
//!
//! Ride writes leave `driver_location` alone unless asked to replace it, so a
//! location ping that lands between another call's read and its write is kept.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    Child, Notification, Party, Profile, Rating, RatingHalf, RequestStatus, Ride, RideRequest,
    RideStatus, Transaction,
};
use crate::error::Error;

/// What a ride write does with `driver_location`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationWrite {
    /// Keep the stored location, even if it changed after the ride was read.
    Keep,
    /// Store the location carried by the written ride.
    Replace,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, Error>;
    async fn find_child(&self, id: Uuid) -> Result<Option<Child>, Error>;

    async fn insert_request(&self, request: &RideRequest) -> Result<(), Error>;
    async fn find_request(&self, id: Uuid) -> Result<Option<RideRequest>, Error>;
    /// Requests still waiting for a driver, earliest pickup first.
    async fn list_open_requests(&self) -> Result<Vec<RideRequest>, Error>;
    /// All requests of a parent, newest first.
    async fn list_requests(&self, parent_id: Uuid) -> Result<Vec<RideRequest>, Error>;
    async fn update_request(
        &self,
        request: &RideRequest,
        expected: RequestStatus,
    ) -> Result<bool, Error>;
    /// Moves `request` out of `requested` and inserts `ride` atomically. No
    /// ride is written when the guard fails.
    async fn accept_request(&self, request: &RideRequest, ride: &Ride) -> Result<bool, Error>;

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error>;
    /// Rides a user takes part in on the given side, latest pickup first.
    async fn list_rides(&self, party: Party, user_id: Uuid) -> Result<Vec<Ride>, Error>;
    /// Accepted and in-progress rides of a user, earliest pickup first.
    async fn list_active_rides(&self, party: Party, user_id: Uuid) -> Result<Vec<Ride>, Error>;
    async fn update_ride(
        &self,
        ride: &Ride,
        expected: RideStatus,
        location: LocationWrite,
    ) -> Result<bool, Error>;
    /// Writes the completed `ride` (guarded on `in_progress`), appends
    /// `transaction` and credits the driver's wallet, all or nothing.
    async fn complete_ride(
        &self,
        ride: &Ride,
        transaction: &Transaction,
        location: LocationWrite,
    ) -> Result<bool, Error>;

    async fn find_rating(&self, ride_id: Uuid) -> Result<Option<Rating>, Error>;
    /// Creates the ride's rating row if missing and overwrites only the half
    /// belonging to `half.party`.
    async fn upsert_rating(&self, ride_id: Uuid, half: &RatingHalf) -> Result<Rating, Error>;

    /// Wallet credits of a user, newest first.
    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, Error>;

    async fn insert_notification(&self, notification: &Notification) -> Result<(), Error>;
    /// Notifications addressed to a user, newest first.
    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, Error>;
}
