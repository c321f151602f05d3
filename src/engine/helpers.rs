use rand::Rng;
use uuid::Uuid;

use super::Engine;
use crate::{
    auth::{Role, User},
    config::EngineConfig,
    entities::{Party, Ride, RideRequest},
    error::Error,
};

/// Numeric one-time code of exactly `length` digits. Leading zeros are kept,
/// so every code of that length is equally likely.
pub fn generate_otp<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn default_fare<R: Rng + ?Sized>(rng: &mut R, config: &EngineConfig) -> i64 {
    rng.gen_range(config.default_fare_min..=config.default_fare_max)
}

/// Side of a ride the caller acts on. The policy has already checked that
/// the caller's role matches that side.
pub fn party_of(user: &User) -> Party {
    match user.role {
        Role::Parent => Party::Parent,
        Role::Driver => Party::Driver,
    }
}

/// Only the parent gets to see the trip-start code; they read it out to the
/// driver at pickup.
pub fn present(ride: Ride, user: &User) -> Ride {
    if user.role == Role::Parent && user.id == ride.parent_id {
        ride
    } else {
        ride.without_otp()
    }
}

impl Engine {
    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_request(&self, id: Uuid) -> Result<RideRequest, Error> {
        self.store
            .find_request(id)
            .await?
            .ok_or_else(|| Error::not_found_error("ride request"))
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_ride(&self, id: Uuid) -> Result<Ride, Error> {
        self.store
            .find_ride(id)
            .await?
            .ok_or_else(|| Error::not_found_error("ride"))
    }
}
