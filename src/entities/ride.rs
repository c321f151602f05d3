use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Coordinates, RideRequest};
use crate::error::Error;

pub const OTP_MIN_LENGTH: usize = 4;
pub const OTP_MAX_LENGTH: usize = 6;

/// A matched trip with an assigned driver.
///
/// Mutated only through the transition methods below; `otp`, `driver_id` and
/// `request_id` never change after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, PolarClass)]
pub struct Ride {
    #[polar(attribute)]
    pub id: Uuid,
    pub request_id: Uuid,
    #[polar(attribute)]
    pub parent_id: Uuid,
    pub child_id: Uuid,
    #[polar(attribute)]
    pub driver_id: Uuid,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_time: DateTime<Utc>,
    pub dropoff_time: Option<DateTime<Utc>>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub otp: String,
    pub price: i64,
    pub driver_location: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Which side of a ride a user is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Party {
    Parent,
    Driver,
}

fn terminal_error(status: Status) -> Error {
    Error::conflict_error(format!("ride is already {}", status.name()))
}

impl Ride {
    pub fn from_request(request: &RideRequest, driver_id: Uuid, otp: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: request.id,
            parent_id: request.parent_id,
            child_id: request.child_id,
            driver_id,
            pickup_address: request.pickup_address.clone(),
            dropoff_address: request.dropoff_address.clone(),
            pickup_time: request.pickup_time,
            dropoff_time: None,
            status: Status::Accepted,
            otp,
            price: request.price,
            driver_location: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Copy of the ride without the trip-start code, for viewers other than
    /// the parent.
    pub fn without_otp(mut self) -> Self {
        self.otp = String::new();
        self
    }

    #[tracing::instrument(skip(self, candidate), fields(ride_id = %self.id))]
    pub fn start(&mut self, candidate: &str) -> Result<(), Error> {
        match self.status {
            Status::Accepted => {}
            Status::InProgress => return Err(Error::conflict_error("ride already started")),
            status => return Err(terminal_error(status)),
        }

        let well_formed = (OTP_MIN_LENGTH..=OTP_MAX_LENGTH).contains(&candidate.len())
            && candidate.bytes().all(|b| b.is_ascii_digit());

        if !well_formed {
            return Err(Error::field_error(
                "otp",
                format!(
                    "OTP must be {} to {} digits",
                    OTP_MIN_LENGTH, OTP_MAX_LENGTH
                ),
            ));
        }

        if candidate != self.otp {
            return Err(Error::field_error("otp", "Invalid OTP"));
        }

        self.status = Status::InProgress;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::InProgress => {
                self.status = Status::Completed;
                self.dropoff_time = Some(at);
                Ok(())
            }
            Status::Accepted => Err(Error::conflict_error("ride has not started")),
            status => Err(terminal_error(status)),
        }
    }

    /// Either party may cancel before the trip starts; once the child is on
    /// board only the driver can abort it.
    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn cancel(&mut self, by: Party) -> Result<(), Error> {
        match (self.status, by) {
            (Status::Accepted, _) | (Status::InProgress, Party::Driver) => {
                self.status = Status::Cancelled;
                Ok(())
            }
            (Status::InProgress, Party::Parent) => Err(Error::unauthorized_error()),
            (status, _) => Err(terminal_error(status)),
        }
    }

    pub fn annotate_location(&mut self, coordinates: Coordinates) -> Result<(), Error> {
        if self.status.is_terminal() {
            return Err(terminal_error(self.status));
        }

        coordinates.validate()?;
        self.driver_location = Some(coordinates);

        Ok(())
    }
}
