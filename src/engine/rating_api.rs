use super::helpers::party_of;
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RatingAPI,
    auth::User,
    entities::{Rating, RatingHalf, RideStatus},
    error::Error,
};

#[async_trait]
impl RatingAPI for Engine {
    #[tracing::instrument(skip(self, comment))]
    async fn rate_ride(
        &self,
        user: User,
        ride_id: Uuid,
        score: i16,
        comment: Option<String>,
    ) -> Result<Rating, Error> {
        let ride = self.fetch_ride(ride_id).await?;

        self.authorize(user.clone(), "rate", ride.clone())?;

        let half = RatingHalf::new(party_of(&user), score, comment)?;

        if self.config.rating_requires_completion && ride.status != RideStatus::Completed {
            return Err(Error::conflict_error(
                "ride must be completed before it can be rated",
            ));
        }

        let rating = self.store.upsert_rating(ride.id, &half).await?;

        tracing::info!(rating_id = %rating.id, party = ?half.party, "ride rated");

        Ok(rating)
    }

    #[tracing::instrument(skip(self))]
    async fn find_rating(&self, user: User, ride_id: Uuid) -> Result<Option<Rating>, Error> {
        let ride = self.fetch_ride(ride_id).await?;

        self.authorize(user, "read", ride)?;

        self.store.find_rating(ride_id).await
    }
}
