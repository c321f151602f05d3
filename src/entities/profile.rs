use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub role: Role,
    pub wallet_balance: i64,
}

impl Profile {
    pub fn new(id: Uuid, full_name: String, role: Role) -> Self {
        Self {
            id,
            full_name,
            role,
            wallet_balance: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub full_name: String,
}

impl Child {
    pub fn new(parent_id: Uuid, full_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id,
            full_name,
        }
    }
}
