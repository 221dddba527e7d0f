use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::{DynAPI, MapAPI, TripAPI};
use crate::entities::{MapView, TripInputPatch, TripSession};
use crate::error::Error;

pub async fn create(Extension(api): Extension<DynAPI>) -> Result<Json<TripSession>, Error> {
    let trip = api.create_trip().await?;

    Ok(trip.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripSession>, Error> {
    let trip = api.find_trip(id).await?;

    Ok(trip.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TripInputPatch>,
) -> Result<Json<TripSession>, Error> {
    let trip = api.update_trip(id, patch).await?;

    Ok(trip.into())
}

pub async fn submit(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripSession>, Error> {
    let trip = api.submit_trip(id).await?;

    Ok(trip.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripSession>, Error> {
    let trip = api.delete_trip(id).await?;

    Ok(trip.into())
}

pub async fn map(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<MapView>, Error> {
    let map = api.find_map(id).await?;

    Ok(map.into())
}
