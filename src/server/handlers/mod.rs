pub mod notifications;
pub mod ride_requests;
pub mod rides;
pub mod wallet;
