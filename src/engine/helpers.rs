use super::Sessions;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    entities::TripSession,
    error::{not_found_error, Error},
};

#[tracing::instrument(skip(sessions))]
pub async fn fetch_session(sessions: &Sessions, id: &Uuid) -> Result<TripSession, Error> {
    let sessions = sessions.lock().await;

    sessions.get(id).cloned().ok_or_else(not_found_error)
}

/// Runs `f` under the store lock. Never hold the lock across a network call.
pub async fn update_session<T, F>(sessions: &Sessions, id: &Uuid, f: F) -> Result<T, Error>
where
    F: FnOnce(&mut TripSession) -> T,
{
    let mut sessions = sessions.lock().await;
    let session = sessions.get_mut(id).ok_or_else(not_found_error)?;

    Ok(f(session))
}

#[tracing::instrument(skip(sessions, session), fields(id = %session.id))]
pub async fn insert_session(sessions: &Sessions, session: TripSession) {
    sessions.lock().await.insert(session.id, session);
}

#[tracing::instrument(skip(sessions))]
pub async fn remove_session(sessions: &Sessions, id: &Uuid) -> Result<TripSession, Error> {
    sessions.lock().await.remove(id).ok_or_else(not_found_error)
}

/// Drops sessions untouched since `cutoff`. A session with a submit in flight
/// is kept so its result still has somewhere to land.
pub async fn evict_sessions(sessions: &Sessions, cutoff: DateTime<Utc>) -> usize {
    let mut sessions = sessions.lock().await;
    let before = sessions.len();

    sessions.retain(|_, session| session.is_in_flight() || session.updated_at >= cutoff);

    before - sessions.len()
}
