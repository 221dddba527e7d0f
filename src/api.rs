use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{MapView, TripInputPatch, TripSession};
use crate::error::Error;

#[async_trait]
pub trait TripAPI {
    async fn create_trip(&self) -> Result<TripSession, Error>;
    async fn find_trip(&self, id: Uuid) -> Result<TripSession, Error>;
    async fn update_trip(&self, id: Uuid, patch: TripInputPatch) -> Result<TripSession, Error>;
    async fn submit_trip(&self, id: Uuid) -> Result<TripSession, Error>;
    async fn delete_trip(&self, id: Uuid) -> Result<TripSession, Error>;
}

#[async_trait]
pub trait MapAPI {
    async fn find_map(&self, id: Uuid) -> Result<MapView, Error>;
}

pub trait API: TripAPI + MapAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
