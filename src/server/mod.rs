mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::{unexpected_error, Error};
use crate::server::handlers::trips;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/trips", post(trips::create))
        .route(
            "/trips/:id",
            get(trips::find).patch(trips::update).delete(trips::delete),
        )
        .route("/trips/:id/submit", post(trips::submit))
        .route("/trips/:id/map", get(trips::map))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    axum::Server::try_bind(&addr)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to bind");
            unexpected_error()
        })?
        .serve(app.into_make_service())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "server stopped");
            unexpected_error()
        })
}
