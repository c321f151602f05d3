mod handlers;
mod identity;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{notifications, ride_requests, rides, wallet};
use crate::{api::API, error::Error};

pub use identity::{USER_ID_HEADER, USER_ROLE_HEADER};

pub type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route(
            "/ride_requests",
            post(ride_requests::create).get(ride_requests::list),
        )
        .route("/open_ride_requests", get(ride_requests::list_open))
        .route("/ride_requests/:id", get(ride_requests::find))
        .route("/ride_requests/:id/cancel", patch(ride_requests::cancel))
        .route("/ride_requests/:id/accept", patch(ride_requests::accept))
        .route("/rides", get(rides::list))
        .route("/current_ride", get(rides::current))
        .route("/rides/:id", get(rides::find))
        .route("/rides/:id/otp", patch(rides::submit_otp))
        .route("/rides/:id/status", patch(rides::advance_status))
        .route("/rides/:id/location", patch(rides::update_location))
        .route(
            "/rides/:id/rating",
            get(rides::find_rating).put(rides::rate),
        )
        .route("/wallet", get(wallet::find))
        .route("/notifications", get(notifications::list))
        .layer(Extension(api))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "server error");
            Error::unexpected_error()
        })
}
