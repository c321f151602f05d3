use serde::Serialize;
use uuid::Uuid;

use crate::entities::{Ride, Transaction};

/// A ride joined with the display names of the people involved. Read-only;
/// nothing in the lifecycle logic looks at the joined fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RideView {
    #[serde(flatten)]
    pub ride: Ride,
    pub parent_name: Option<String>,
    pub driver_name: Option<String>,
    pub child_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: i64,
    pub transactions: Vec<Transaction>,
}
