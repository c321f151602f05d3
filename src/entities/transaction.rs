use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Ride;

/// Append-only wallet credit created when a ride completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ride_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn ride_earning(ride: &Ride) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: ride.driver_id,
            ride_id: ride.id,
            amount: ride.price,
            description: format!(
                "Ride from {} to {}",
                ride.pickup_address, ride.dropoff_address
            ),
            created_at: Utc::now(),
        }
    }
}
