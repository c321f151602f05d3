use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn validate(&self) -> Result<(), Error> {
        let latitude_ok = (-90.0..=90.0).contains(&self.latitude);
        let longitude_ok = (-180.0..=180.0).contains(&self.longitude);

        if !(latitude_ok && longitude_ok) {
            return Err(Error::field_error("location", "coordinates out of range"));
        }

        Ok(())
    }
}

#[test]
fn coordinates_validation_test() {
    assert!(Coordinates {
        latitude: 6.9271,
        longitude: 79.8612
    }
    .validate()
    .is_ok());

    let err = Coordinates {
        latitude: 91.0,
        longitude: 0.0,
    }
    .validate()
    .unwrap_err();
    assert_eq!(err.field.as_deref(), Some("location"));

    assert!(Coordinates {
        latitude: f64::NAN,
        longitude: 0.0
    }
    .validate()
    .is_err());
}
