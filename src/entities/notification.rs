use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: Kind,
    pub reference_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    RideAccepted,
    RideStarted,
    RideCompleted,
    RideCancelled,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RideAccepted => "ride_accepted",
            Self::RideStarted => "ride_started",
            Self::RideCompleted => "ride_completed",
            Self::RideCancelled => "ride_cancelled",
        }
    }
}

impl Notification {
    pub fn new(user_id: Uuid, title: &str, message: &str, kind: Kind, reference_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            reference_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}
