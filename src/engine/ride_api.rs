use super::helpers::{party_of, present};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::User,
    db::LocationWrite,
    entities::{Coordinates, NotificationKind, Party, Ride, RideStatus, RideView, Transaction},
    error::Error,
};

fn status_changed() -> Error {
    Error::conflict_error("ride status changed, refresh and try again")
}

impl Engine {
    async fn complete_ride(&self, mut ride: Ride, location: LocationWrite) -> Result<Ride, Error> {
        ride.complete(Utc::now())?;

        let transaction = Transaction::ride_earning(&ride);

        // status write, ledger entry and wallet credit land together or not at all
        if !self.store.complete_ride(&ride, &transaction, location).await? {
            tracing::warn!(ride_id = %ride.id, "ride was settled concurrently");
            return Err(status_changed());
        }

        tracing::info!(
            ride_id = %ride.id,
            driver_id = %ride.driver_id,
            amount = transaction.amount,
            "ride completed and settled"
        );

        self.notify(
            ride.parent_id,
            "Ride Completed",
            "Your child has been dropped off.",
            NotificationKind::RideCompleted,
            ride.id,
        )
        .await;

        Ok(ride)
    }

    async fn cancel_ride(
        &self,
        mut ride: Ride,
        by: Party,
        location: LocationWrite,
    ) -> Result<Ride, Error> {
        let expected = ride.status;

        ride.cancel(by)?;

        if !self.store.update_ride(&ride, expected, location).await? {
            tracing::warn!(ride_id = %ride.id, "ride changed while cancelling");
            return Err(status_changed());
        }

        tracing::info!(ride_id = %ride.id, by = ?by, "ride cancelled");

        self.notify(
            ride.parent_id,
            "Ride Cancelled",
            "Your ride has been cancelled.",
            NotificationKind::RideCancelled,
            ride.id,
        )
        .await;

        if by == Party::Parent {
            self.notify(
                ride.driver_id,
                "Ride Cancelled",
                "The parent has cancelled the ride.",
                NotificationKind::RideCancelled,
                ride.id,
            )
            .await;
        }

        Ok(ride)
    }
}

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, user: User, id: Uuid) -> Result<RideView, Error> {
        let ride = self.fetch_ride(id).await?;

        self.authorize(user.clone(), "read", ride.clone())?;

        let parent_name = self
            .store
            .find_profile(ride.parent_id)
            .await?
            .map(|p| p.full_name);
        let driver_name = self
            .store
            .find_profile(ride.driver_id)
            .await?
            .map(|p| p.full_name);
        let child_name = self
            .store
            .find_child(ride.child_id)
            .await?
            .map(|c| c.full_name);

        Ok(RideView {
            ride: present(ride, &user),
            parent_name,
            driver_name,
            child_name,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides(&self, user: User) -> Result<Vec<Ride>, Error> {
        let rides = self.store.list_rides(party_of(&user), user.id).await?;

        Ok(rides.into_iter().map(|ride| present(ride, &user)).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_current_ride(&self, user: User) -> Result<Option<Ride>, Error> {
        let rides = self
            .store
            .list_active_rides(party_of(&user), user.id)
            .await?;

        if rides.len() > 1 {
            tracing::warn!(count = rides.len(), "more than one active ride, using earliest pickup");
        }

        Ok(rides.into_iter().next().map(|ride| present(ride, &user)))
    }

    #[tracing::instrument(skip(self, otp))]
    async fn submit_otp(&self, user: User, id: Uuid, otp: String) -> Result<Ride, Error> {
        let mut ride = self.fetch_ride(id).await?;

        self.authorize(user.clone(), "submit_otp", ride.clone())?;

        if let Err(err) = ride.start(&otp) {
            tracing::info!(error = %err, "trip start rejected");
            return Err(err);
        }

        if !self
            .store
            .update_ride(&ride, RideStatus::Accepted, LocationWrite::Keep)
            .await?
        {
            tracing::warn!("ride changed while starting");
            return Err(status_changed());
        }

        tracing::info!("ride started");

        self.notify(
            ride.parent_id,
            "Ride Started",
            "Your child has been picked up.",
            NotificationKind::RideStarted,
            ride.id,
        )
        .await;

        Ok(present(ride, &user))
    }

    #[tracing::instrument(skip(self))]
    async fn advance_status(
        &self,
        user: User,
        id: Uuid,
        target: RideStatus,
        location: Option<Coordinates>,
    ) -> Result<Ride, Error> {
        let mut ride = self.fetch_ride(id).await?;

        self.authorize(user.clone(), "read", ride.clone())?;

        if ride.status.is_terminal() {
            return Err(Error::conflict_error(format!(
                "ride is already {}",
                ride.status.name()
            )));
        }

        let action = match target {
            RideStatus::Completed => "complete",
            RideStatus::Cancelled => "cancel",
            RideStatus::InProgress => {
                return Err(Error::field_error(
                    "status",
                    "rides start by submitting the OTP",
                ))
            }
            RideStatus::Accepted => {
                return Err(Error::field_error("status", "rides cannot return to accepted"))
            }
        };

        self.authorize(user.clone(), action, ride.clone())?;

        let party = party_of(&user);

        // recorded in the same write as the transition
        let location = match (location, party) {
            (Some(location), Party::Driver) => {
                ride.annotate_location(location)?;
                LocationWrite::Replace
            }
            _ => LocationWrite::Keep,
        };

        let ride = match target {
            RideStatus::Completed => self.complete_ride(ride, location).await?,
            _ => self.cancel_ride(ride, party, location).await?,
        };

        Ok(present(ride, &user))
    }

    #[tracing::instrument(skip(self))]
    async fn update_driver_location(
        &self,
        user: User,
        id: Uuid,
        location: Coordinates,
    ) -> Result<Ride, Error> {
        let mut ride = self.fetch_ride(id).await?;

        self.authorize(user.clone(), "update_location", ride.clone())?;

        let expected = ride.status;
        ride.annotate_location(location)?;

        if !self
            .store
            .update_ride(&ride, expected, LocationWrite::Replace)
            .await?
        {
            tracing::warn!("ride changed while updating location");
            return Err(status_changed());
        }

        Ok(present(ride, &user))
    }
}
