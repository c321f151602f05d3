use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Party;
use crate::error::Error;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

/// Shared rating row of a ride. Each party only ever writes its own half.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub parent_rating: Option<i16>,
    pub parent_comment: Option<String>,
    pub driver_rating: Option<i16>,
    pub driver_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One party's half of a rating.
#[derive(Clone, Debug, PartialEq)]
pub struct RatingHalf {
    pub party: Party,
    pub score: i16,
    pub comment: Option<String>,
}

impl RatingHalf {
    pub fn new(party: Party, score: i16, comment: Option<String>) -> Result<Self, Error> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(Error::field_error(
                "rating",
                format!("rating must be between {} and {}", MIN_SCORE, MAX_SCORE),
            ));
        }

        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            party,
            score,
            comment,
        })
    }
}

impl Rating {
    pub fn new(ride_id: Uuid) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            ride_id,
            parent_rating: None,
            parent_comment: None,
            driver_rating: None,
            driver_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, half: RatingHalf) {
        match half.party {
            Party::Parent => {
                self.parent_rating = Some(half.score);
                self.parent_comment = half.comment;
            }
            Party::Driver => {
                self.driver_rating = Some(half.score);
                self.driver_comment = half.comment;
            }
        }

        self.updated_at = Utc::now();
    }
}

#[test]
fn halves_are_independent_test() {
    let mut rating = Rating::new(Uuid::new_v4());

    rating.apply(RatingHalf::new(Party::Driver, 4, Some("polite kid".into())).unwrap());
    rating.apply(RatingHalf::new(Party::Parent, 5, None).unwrap());

    assert_eq!(rating.driver_rating, Some(4));
    assert_eq!(rating.driver_comment.as_deref(), Some("polite kid"));
    assert_eq!(rating.parent_rating, Some(5));
    assert_eq!(rating.parent_comment, None);

    rating.apply(RatingHalf::new(Party::Parent, 3, Some("  late  ".into())).unwrap());
    assert_eq!(rating.parent_rating, Some(3));
    assert_eq!(rating.parent_comment.as_deref(), Some("late"));
    assert_eq!(rating.driver_rating, Some(4));
}

#[test]
fn score_range_test() {
    assert!(RatingHalf::new(Party::Parent, 0, None).is_err());
    assert!(RatingHalf::new(Party::Parent, 6, None).is_err());
    assert!(RatingHalf::new(Party::Driver, 1, None).is_ok());
    assert!(RatingHalf::new(Party::Driver, 5, None).is_ok());
}
