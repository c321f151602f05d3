use super::helpers::{generate_otp, present};
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::MatchingAPI,
    auth::User,
    entities::{NotificationKind, Ride},
    error::Error,
};

fn request_gone() -> Error {
    Error::conflict_error("ride request is no longer available")
}

#[async_trait]
impl MatchingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn accept_request(&self, user: User, request_id: Uuid) -> Result<Ride, Error> {
        let mut request = self.fetch_request(request_id).await?;

        self.authorize(user.clone(), "accept", request.clone())?;

        if !request.is_open() {
            tracing::info!(status = request.status.name(), "ride request is not open");
            return Err(request_gone());
        }

        request.accept()?;

        let otp = generate_otp(&mut rand::thread_rng(), self.config.otp_length);
        let ride = Ride::from_request(&request, user.id, otp);

        // guarded on `requested`: of two concurrent drivers only one gets a ride
        if !self.store.accept_request(&request, &ride).await? {
            tracing::warn!("lost the race for ride request");
            return Err(request_gone());
        }

        tracing::info!(ride_id = %ride.id, "ride request accepted");

        self.notify(
            ride.parent_id,
            "Ride Accepted",
            "A driver has accepted your ride request.",
            NotificationKind::RideAccepted,
            ride.id,
        )
        .await;

        Ok(present(ride, &user))
    }
}
