use oso::PolarClass;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Driver,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Driver => "driver",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parent" => Ok(Self::Parent),
            "driver" => Ok(Self::Driver),
            _ => Err(Error::unauthorized_error()),
        }
    }
}

/// An authenticated principal, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
}

impl User {
    pub fn parent(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Parent,
        }
    }

    pub fn driver(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Driver,
        }
    }

    fn has_role(&self, role: String) -> bool {
        self.role.name() == role
    }
}

impl PolarClass for User {
    fn get_polar_class_builder() -> oso::ClassBuilder<User> {
        oso::Class::builder()
            .name("User")
            .add_attribute_getter("id", |recv: &User| recv.id)
            .add_attribute_getter("role", |recv: &User| recv.role.name().to_string())
            .add_method("has_role", User::has_role)
    }

    fn get_polar_class() -> oso::Class {
        let builder = User::get_polar_class_builder();
        builder.build()
    }
}

#[test]
fn role_parsing_test() {
    assert_eq!("parent".parse::<Role>().unwrap(), Role::Parent);
    assert_eq!(" Driver ".parse::<Role>().unwrap(), Role::Driver);
    assert!("admin".parse::<Role>().unwrap_err().is_unauthorized_error());
}
