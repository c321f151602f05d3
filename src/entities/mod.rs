mod location;
mod notification;
mod profile;
mod rating;
pub mod ride;
pub mod ride_request;
mod transaction;
mod views;

pub use location::Coordinates;
pub use notification::{Kind as NotificationKind, Notification};
pub use profile::{Child, Profile};
pub use rating::{Rating, RatingHalf};
pub use ride::{Party, Ride, Status as RideStatus};
pub use ride_request::{RideRequest, Status as RequestStatus};
pub use transaction::Transaction;
pub use views::{RideView, Wallet};
