use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// An unmatched ask for transportation, before any driver accepts it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, PolarClass)]
pub struct RideRequest {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub parent_id: Uuid,
    pub child_id: Uuid,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_time: DateTime<Utc>,
    pub price: i64,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Requested,
    Accepted,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl RideRequest {
    pub fn new(
        parent_id: Uuid,
        child_id: Uuid,
        pickup_address: String,
        dropoff_address: String,
        pickup_time: DateTime<Utc>,
        price: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id,
            child_id,
            pickup_address,
            dropoff_address,
            pickup_time,
            price,
            status: Status::Requested,
            created_at: Utc::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == Status::Requested
    }

    #[tracing::instrument(skip(self), fields(request_id = %self.id))]
    pub fn accept(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Requested => {
                self.status = Status::Accepted;
                Ok(())
            }
            Status::Accepted => Err(Error::conflict_error("ride request already accepted")),
            Status::Cancelled => Err(Error::conflict_error("ride request was cancelled")),
        }
    }

    #[tracing::instrument(skip(self), fields(request_id = %self.id))]
    pub fn cancel(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Requested => {
                self.status = Status::Cancelled;
                Ok(())
            }
            Status::Accepted => Err(Error::conflict_error("ride request already accepted")),
            Status::Cancelled => Err(Error::conflict_error("ride request already cancelled")),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_request(parent_id: Uuid) -> RideRequest {
    RideRequest::new(
        parent_id,
        Uuid::new_v4(),
        "10 Home St".into(),
        "School Rd".into(),
        Utc::now() + chrono::Duration::minutes(30),
        1000,
    )
}

#[test]
fn accept_is_single_shot_test() {
    let mut request = sample_request(Uuid::new_v4());

    assert!(request.is_open());
    request.accept().unwrap();
    assert_eq!(request.status, Status::Accepted);

    let err = request.accept().unwrap_err();
    assert!(err.is_conflict_error());

    let err = request.cancel().unwrap_err();
    assert!(err.is_conflict_error());
}

#[test]
fn cancelled_request_cannot_be_accepted_test() {
    let mut request = sample_request(Uuid::new_v4());

    request.cancel().unwrap();
    assert!(!request.is_open());

    assert!(request.accept().unwrap_err().is_conflict_error());
    assert!(request.cancel().unwrap_err().is_conflict_error());
}
