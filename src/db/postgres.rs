use async_trait::async_trait;
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    query::Query,
    types::Json,
    Executor, Pool, Postgres, Row, Transaction as DbTransaction,
};
use uuid::Uuid;

use super::{LocationWrite, Store};
use crate::auth::Role;
use crate::entities::{
    Child, Notification, Party, Profile, Rating, RatingHalf, RequestStatus, Ride, RideRequest,
    RideStatus, Transaction,
};
use crate::error::Error;

type Database = Postgres;

const SCHEMA: [&str; 10] = [
    "CREATE TABLE IF NOT EXISTS profiles (id UUID PRIMARY KEY, full_name VARCHAR NOT NULL, role VARCHAR NOT NULL, wallet_balance BIGINT NOT NULL DEFAULT 0)",
    "CREATE TABLE IF NOT EXISTS children (id UUID PRIMARY KEY, parent_id UUID NOT NULL, full_name VARCHAR NOT NULL)",
    "CREATE TABLE IF NOT EXISTS ride_requests (id UUID PRIMARY KEY, parent_id UUID NOT NULL, status VARCHAR NOT NULL, pickup_time TIMESTAMPTZ NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS ride_requests_open_idx ON ride_requests (status, pickup_time)",
    "CREATE TABLE IF NOT EXISTS rides (id UUID PRIMARY KEY, request_id UUID NOT NULL UNIQUE REFERENCES ride_requests(id), parent_id UUID NOT NULL, driver_id UUID NOT NULL, status VARCHAR NOT NULL, pickup_time TIMESTAMPTZ NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS rides_parent_idx ON rides (parent_id, status)",
    "CREATE INDEX IF NOT EXISTS rides_driver_idx ON rides (driver_id, status)",
    "CREATE TABLE IF NOT EXISTS ratings (id UUID PRIMARY KEY, ride_id UUID NOT NULL UNIQUE REFERENCES rides(id), parent_rating SMALLINT, parent_comment TEXT, driver_rating SMALLINT, driver_comment TEXT, created_at TIMESTAMPTZ NOT NULL, updated_at TIMESTAMPTZ NOT NULL)",
    "CREATE TABLE IF NOT EXISTS transactions (id UUID PRIMARY KEY, user_id UUID NOT NULL, ride_id UUID NOT NULL UNIQUE REFERENCES rides(id), created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE TABLE IF NOT EXISTS notifications (id UUID PRIMARY KEY, user_id UUID NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
];

const RATING_COLUMNS: &str =
    "id, ride_id, parent_rating, parent_comment, driver_rating, driver_comment, created_at, updated_at";

pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::connect", skip(db_uri))]
    pub async fn connect(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        Ok(Self { pool })
    }

    /// Creates missing tables and indexes. Safe to run on every start.
    #[tracing::instrument(name = "PgStore::migrate", skip(self))]
    pub async fn migrate(&self) -> Result<(), Error> {
        for statement in SCHEMA {
            self.pool.execute(statement).await?;
        }

        Ok(())
    }

    async fn fetch_data<T>(&self, query: Query<'_, Database, PgArguments>) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        let mut conn = self.pool.acquire().await?;
        let mut rows = conn.fetch(query);

        let mut items = Vec::new();

        while let Some(row) = rows.try_next().await? {
            let Json(item): Json<T> = row.try_get("data")?;
            items.push(item);
        }

        Ok(items)
    }

    async fn fetch_one_data<T>(
        &self,
        query: Query<'_, Database, PgArguments>,
    ) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        let mut conn = self.pool.acquire().await?;

        let maybe_row = conn.fetch_optional(query).await?;

        match maybe_row {
            Some(row) => {
                let Json(item): Json<T> = row.try_get("data")?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

fn party_column(party: Party) -> &'static str {
    match party {
        Party::Parent => "parent_id",
        Party::Driver => "driver_id",
    }
}

#[tracing::instrument(skip(tx, ride), fields(ride_id = %ride.id))]
async fn update_ride_guarded(
    tx: &mut DbTransaction<'_, Database>,
    ride: &Ride,
    expected: RideStatus,
    location: LocationWrite,
) -> Result<bool, Error> {
    let query = match location {
        LocationWrite::Replace => {
            "UPDATE rides SET status = $3, data = $4 WHERE id = $1 AND status = $2"
        }
        // the stored location wins over the one read by the caller
        LocationWrite::Keep => {
            "UPDATE rides SET status = $3, data = jsonb_set($4, '{driver_location}', COALESCE(data->'driver_location', 'null'::jsonb)) WHERE id = $1 AND status = $2"
        }
    };

    let result = tx
        .execute(
            sqlx::query(query)
                .bind(ride.id)
                .bind(expected.name())
                .bind(ride.status.name())
                .bind(Json(ride)),
        )
        .await?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_row = conn
            .fetch_optional(
                sqlx::query("SELECT id, full_name, role, wallet_balance FROM profiles WHERE id = $1")
                    .bind(id),
            )
            .await?;

        let row = match maybe_row {
            Some(row) => row,
            None => return Ok(None),
        };

        let role: String = row.try_get("role")?;
        let role: Role = role.parse().map_err(|_| Error::unexpected_error())?;

        Ok(Some(Profile {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            role,
            wallet_balance: row.try_get("wallet_balance")?,
        }))
    }

    #[tracing::instrument(skip(self))]
    async fn find_child(&self, id: Uuid) -> Result<Option<Child>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_row = conn
            .fetch_optional(
                sqlx::query("SELECT id, parent_id, full_name FROM children WHERE id = $1").bind(id),
            )
            .await?;

        match maybe_row {
            Some(row) => Ok(Some(Child {
                id: row.try_get("id")?,
                parent_id: row.try_get("parent_id")?,
                full_name: row.try_get("full_name")?,
            })),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
    async fn insert_request(&self, request: &RideRequest) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO ride_requests (id, parent_id, status, pickup_time, created_at, data) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(request.id)
            .bind(request.parent_id)
            .bind(request.status.name())
            .bind(request.pickup_time)
            .bind(request.created_at)
            .bind(Json(request)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_request(&self, id: Uuid) -> Result<Option<RideRequest>, Error> {
        self.fetch_one_data(sqlx::query("SELECT data FROM ride_requests WHERE id = $1").bind(id))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_open_requests(&self) -> Result<Vec<RideRequest>, Error> {
        self.fetch_data(
            sqlx::query(
                "SELECT data FROM ride_requests WHERE status = $1 ORDER BY pickup_time ASC, created_at ASC, id ASC",
            )
            .bind(RequestStatus::Requested.name()),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_requests(&self, parent_id: Uuid) -> Result<Vec<RideRequest>, Error> {
        self.fetch_data(
            sqlx::query(
                "SELECT data FROM ride_requests WHERE parent_id = $1 ORDER BY created_at DESC, id ASC",
            )
            .bind(parent_id),
        )
        .await
    }

    #[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
    async fn update_request(
        &self,
        request: &RideRequest,
        expected: RequestStatus,
    ) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "UPDATE ride_requests SET status = $3, data = $4 WHERE id = $1 AND status = $2",
                )
                .bind(request.id)
                .bind(expected.name())
                .bind(request.status.name())
                .bind(Json(request)),
            )
            .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self, request, ride), fields(request_id = %request.id, ride_id = %ride.id))]
    async fn accept_request(&self, request: &RideRequest, ride: &Ride) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;

        let result = tx
            .execute(
                sqlx::query(
                    "UPDATE ride_requests SET status = $3, data = $4 WHERE id = $1 AND status = $2",
                )
                .bind(request.id)
                .bind(RequestStatus::Requested.name())
                .bind(request.status.name())
                .bind(Json(request)),
            )
            .await?;

        if result.rows_affected() != 1 {
            tracing::info!("ride request no longer open, rolling back");
            tx.rollback().await?;
            return Ok(false);
        }

        tx.execute(
            sqlx::query(
                "INSERT INTO rides (id, request_id, parent_id, driver_id, status, pickup_time, created_at, data) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(ride.id)
            .bind(ride.request_id)
            .bind(ride.parent_id)
            .bind(ride.driver_id)
            .bind(ride.status.name())
            .bind(ride.pickup_time)
            .bind(ride.created_at)
            .bind(Json(ride)),
        )
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        self.fetch_one_data(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(id))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides(&self, party: Party, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let query = format!(
            "SELECT data FROM rides WHERE {} = $1 ORDER BY pickup_time DESC, id ASC",
            party_column(party)
        );

        self.fetch_data(sqlx::query(&query).bind(user_id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_active_rides(&self, party: Party, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let query = format!(
            "SELECT data FROM rides WHERE {} = $1 AND status IN ($2, $3) ORDER BY pickup_time ASC, created_at ASC, id ASC",
            party_column(party)
        );

        self.fetch_data(
            sqlx::query(&query)
                .bind(user_id)
                .bind(RideStatus::Accepted.name())
                .bind(RideStatus::InProgress.name()),
        )
        .await
    }

    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn update_ride(
        &self,
        ride: &Ride,
        expected: RideStatus,
        location: LocationWrite,
    ) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;

        let updated = update_ride_guarded(&mut tx, ride, expected, location).await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(skip(self, ride, transaction), fields(ride_id = %ride.id))]
    async fn complete_ride(
        &self,
        ride: &Ride,
        transaction: &Transaction,
        location: LocationWrite,
    ) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;

        if !update_ride_guarded(&mut tx, ride, RideStatus::InProgress, location).await? {
            tracing::info!("ride no longer in progress, rolling back");
            tx.rollback().await?;
            return Ok(false);
        }

        tx.execute(
            sqlx::query(
                "INSERT INTO transactions (id, user_id, ride_id, created_at, data) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(transaction.id)
            .bind(transaction.user_id)
            .bind(transaction.ride_id)
            .bind(transaction.created_at)
            .bind(Json(transaction)),
        )
        .await?;

        // increment in place; never read-modify-write the balance
        tx.execute(
            sqlx::query(
                "INSERT INTO profiles (id, full_name, role, wallet_balance) VALUES ($1, '', $2, $3) ON CONFLICT (id) DO UPDATE SET wallet_balance = profiles.wallet_balance + EXCLUDED.wallet_balance",
            )
            .bind(transaction.user_id)
            .bind(Role::Driver.name())
            .bind(transaction.amount),
        )
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    async fn find_rating(&self, ride_id: Uuid) -> Result<Option<Rating>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!("SELECT {} FROM ratings WHERE ride_id = $1", RATING_COLUMNS);

        let rating = sqlx::query_as::<_, Rating>(&query)
            .bind(ride_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(rating)
    }

    #[tracing::instrument(skip(self, half))]
    async fn upsert_rating(&self, ride_id: Uuid, half: &RatingHalf) -> Result<Rating, Error> {
        let (score_column, comment_column) = match half.party {
            Party::Parent => ("parent_rating", "parent_comment"),
            Party::Driver => ("driver_rating", "driver_comment"),
        };

        let query = format!(
            "INSERT INTO ratings (id, ride_id, {score}, {comment}, created_at, updated_at) VALUES ($1, $2, $3, $4, now(), now()) \
             ON CONFLICT (ride_id) DO UPDATE SET {score} = EXCLUDED.{score}, {comment} = EXCLUDED.{comment}, updated_at = EXCLUDED.updated_at \
             RETURNING {columns}",
            score = score_column,
            comment = comment_column,
            columns = RATING_COLUMNS,
        );

        let mut conn = self.pool.acquire().await?;

        let rating = sqlx::query_as::<_, Rating>(&query)
            .bind(Uuid::new_v4())
            .bind(ride_id)
            .bind(half.score)
            .bind(half.comment.clone())
            .fetch_one(&mut *conn)
            .await?;

        Ok(rating)
    }

    #[tracing::instrument(skip(self))]
    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, Error> {
        self.fetch_data(
            sqlx::query(
                "SELECT data FROM transactions WHERE user_id = $1 ORDER BY created_at DESC, id ASC",
            )
            .bind(user_id),
        )
        .await
    }

    #[tracing::instrument(skip(self, notification), fields(notification_id = %notification.id))]
    async fn insert_notification(&self, notification: &Notification) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO notifications (id, user_id, created_at, data) VALUES ($1, $2, $3, $4)",
            )
            .bind(notification.id)
            .bind(notification.user_id)
            .bind(notification.created_at)
            .bind(Json(notification)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, Error> {
        self.fetch_data(
            sqlx::query(
                "SELECT data FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id ASC",
            )
            .bind(user_id),
        )
        .await
    }
}
