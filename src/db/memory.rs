use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{LocationWrite, Store};
use crate::auth::Role;
use crate::entities::{
    Child, Notification, Party, Profile, Rating, RatingHalf, RequestStatus, Ride, RideRequest,
    RideStatus, Transaction,
};
use crate::error::Error;

fn write_ride(stored: &mut Ride, ride: &Ride, location: LocationWrite) {
    let driver_location = match location {
        LocationWrite::Keep => stored.driver_location,
        LocationWrite::Replace => ride.driver_location,
    };

    *stored = ride.clone();
    stored.driver_location = driver_location;
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    children: HashMap<Uuid, Child>,
    requests: HashMap<Uuid, RideRequest>,
    rides: HashMap<Uuid, Ride>,
    // request id -> ride id
    rides_by_request: HashMap<Uuid, Uuid>,
    // ride id -> rating
    ratings: HashMap<Uuid, Rating>,
    transactions: Vec<Transaction>,
    notifications: Vec<Notification>,
}

/// Store kept entirely in process memory.
///
/// One lock guards every table, so each trait method runs as a single atomic
/// step. Used for local runs without a database and throughout the tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_profile(&self, profile: Profile) {
        self.tables
            .lock()
            .await
            .profiles
            .insert(profile.id, profile);
    }

    pub async fn add_child(&self, child: Child) {
        self.tables.lock().await.children.insert(child.id, child);
    }

    pub async fn count_rides(&self) -> usize {
        self.tables.lock().await.rides.len()
    }
}

fn is_party(ride: &Ride, party: Party, user_id: Uuid) -> bool {
    match party {
        Party::Parent => ride.parent_id == user_id,
        Party::Driver => ride.driver_id == user_id,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, Error> {
        Ok(self.tables.lock().await.profiles.get(&id).cloned())
    }

    async fn find_child(&self, id: Uuid) -> Result<Option<Child>, Error> {
        Ok(self.tables.lock().await.children.get(&id).cloned())
    }

    async fn insert_request(&self, request: &RideRequest) -> Result<(), Error> {
        let mut tables = self.tables.lock().await;

        if tables.requests.contains_key(&request.id) {
            return Err(Error::conflict_error("ride request already exists"));
        }

        tables.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<RideRequest>, Error> {
        Ok(self.tables.lock().await.requests.get(&id).cloned())
    }

    async fn list_open_requests(&self) -> Result<Vec<RideRequest>, Error> {
        let tables = self.tables.lock().await;

        let mut requests: Vec<RideRequest> = tables
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Requested)
            .cloned()
            .collect();

        requests.sort_by_key(|r| (r.pickup_time, r.created_at, r.id));
        Ok(requests)
    }

    async fn list_requests(&self, parent_id: Uuid) -> Result<Vec<RideRequest>, Error> {
        let tables = self.tables.lock().await;

        let mut requests: Vec<RideRequest> = tables
            .requests
            .values()
            .filter(|r| r.parent_id == parent_id)
            .cloned()
            .collect();

        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(requests)
    }

    async fn update_request(
        &self,
        request: &RideRequest,
        expected: RequestStatus,
    ) -> Result<bool, Error> {
        let mut tables = self.tables.lock().await;

        match tables.requests.get_mut(&request.id) {
            Some(stored) if stored.status == expected => {
                *stored = request.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn accept_request(&self, request: &RideRequest, ride: &Ride) -> Result<bool, Error> {
        let mut tables = self.tables.lock().await;

        let open = matches!(
            tables.requests.get(&request.id),
            Some(stored) if stored.status == RequestStatus::Requested
        );

        if !open || tables.rides_by_request.contains_key(&request.id) {
            return Ok(false);
        }

        tables.requests.insert(request.id, request.clone());
        tables.rides_by_request.insert(request.id, ride.id);
        tables.rides.insert(ride.id, ride.clone());

        Ok(true)
    }

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        Ok(self.tables.lock().await.rides.get(&id).cloned())
    }

    async fn list_rides(&self, party: Party, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let tables = self.tables.lock().await;

        let mut rides: Vec<Ride> = tables
            .rides
            .values()
            .filter(|ride| is_party(ride, party, user_id))
            .cloned()
            .collect();

        rides.sort_by(|a, b| b.pickup_time.cmp(&a.pickup_time).then(a.id.cmp(&b.id)));
        Ok(rides)
    }

    async fn list_active_rides(&self, party: Party, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let tables = self.tables.lock().await;

        let mut rides: Vec<Ride> = tables
            .rides
            .values()
            .filter(|ride| ride.is_active() && is_party(ride, party, user_id))
            .cloned()
            .collect();

        rides.sort_by_key(|ride| (ride.pickup_time, ride.created_at, ride.id));
        Ok(rides)
    }

    async fn update_ride(
        &self,
        ride: &Ride,
        expected: RideStatus,
        location: LocationWrite,
    ) -> Result<bool, Error> {
        let mut tables = self.tables.lock().await;

        match tables.rides.get_mut(&ride.id) {
            Some(stored) if stored.status == expected => {
                write_ride(stored, ride, location);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_ride(
        &self,
        ride: &Ride,
        transaction: &Transaction,
        location: LocationWrite,
    ) -> Result<bool, Error> {
        let mut tables = self.tables.lock().await;

        let already_settled = tables
            .transactions
            .iter()
            .any(|t| t.ride_id == transaction.ride_id);

        match tables.rides.get_mut(&ride.id) {
            Some(stored) if stored.status == RideStatus::InProgress && !already_settled => {
                write_ride(stored, ride, location);
            }
            _ => return Ok(false),
        }

        tables.transactions.push(transaction.clone());

        tables
            .profiles
            .entry(transaction.user_id)
            .or_insert_with(|| Profile::new(transaction.user_id, String::new(), Role::Driver))
            .wallet_balance += transaction.amount;

        Ok(true)
    }

    async fn find_rating(&self, ride_id: Uuid) -> Result<Option<Rating>, Error> {
        Ok(self.tables.lock().await.ratings.get(&ride_id).cloned())
    }

    async fn upsert_rating(&self, ride_id: Uuid, half: &RatingHalf) -> Result<Rating, Error> {
        let mut tables = self.tables.lock().await;

        let rating = tables
            .ratings
            .entry(ride_id)
            .or_insert_with(|| Rating::new(ride_id));

        rating.apply(half.clone());

        Ok(rating.clone())
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, Error> {
        let tables = self.tables.lock().await;

        Ok(tables
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.tables
            .lock()
            .await
            .notifications
            .push(notification.clone());

        Ok(())
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, Error> {
        let tables = self.tables.lock().await;

        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }
}
