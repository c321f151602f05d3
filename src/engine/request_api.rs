use super::helpers::default_fare;
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::{NewRideRequest, RideRequestAPI},
    auth::{Platform, User},
    entities::{RequestStatus, RideRequest},
    error::Error,
};

fn require_address(field: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::field_error(field, "address must not be blank"));
    }

    Ok(value.to_string())
}

#[async_trait]
impl RideRequestAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_request(
        &self,
        user: User,
        params: NewRideRequest,
    ) -> Result<RideRequest, Error> {
        self.authorize(user.clone(), "create_request", Platform::default())?;

        if params.pickup_time <= Utc::now() {
            return Err(Error::field_error(
                "pickup_time",
                "pickup time must be in the future",
            ));
        }

        let pickup_address = require_address("pickup_address", &params.pickup_address)?;
        let dropoff_address = require_address("dropoff_address", &params.dropoff_address)?;

        if let Some(price) = params.price {
            if price <= 0 {
                return Err(Error::field_error("price", "price must be positive"));
            }
        }

        // an unknown child is reported like someone else's child
        let child = self.store.find_child(params.child_id).await?;
        match child {
            Some(child) if child.parent_id == user.id => {}
            _ => {
                tracing::info!(child_id = %params.child_id, "child does not belong to parent");
                return Err(Error::unauthorized_error());
            }
        }

        let price = match params.price {
            Some(price) => price,
            None => default_fare(&mut rand::thread_rng(), &self.config),
        };

        let request = RideRequest::new(
            user.id,
            params.child_id,
            pickup_address,
            dropoff_address,
            params.pickup_time,
            price,
        );

        self.store.insert_request(&request).await?;

        tracing::info!(request_id = %request.id, price, "ride request created");

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn find_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error> {
        let request = self.fetch_request(id).await?;

        self.authorize(user, "read", request.clone())?;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn list_requests(&self, user: User) -> Result<Vec<RideRequest>, Error> {
        self.authorize(user.clone(), "list_requests", Platform::default())?;

        self.store.list_requests(user.id).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_open_requests(&self, user: User) -> Result<Vec<RideRequest>, Error> {
        self.authorize(user, "list_open_requests", Platform::default())?;

        self.store.list_open_requests().await
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_request(&self, user: User, id: Uuid) -> Result<RideRequest, Error> {
        let mut request = self.fetch_request(id).await?;

        self.authorize(user, "cancel", request.clone())?;

        request.cancel()?;

        if !self
            .store
            .update_request(&request, RequestStatus::Requested)
            .await?
        {
            tracing::warn!("ride request changed while cancelling");
            return Err(Error::conflict_error("ride request is no longer available"));
        }

        tracing::info!("ride request cancelled");

        Ok(request)
    }
}
