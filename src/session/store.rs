// src/session/store.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    error::AppError, models::execution::ExecuteSqlResponse, session::quiz::QuizSession,
    utils::debounce::Debouncer,
};

/// A live session plus its debounced SQL preview.
///
/// The session mutex serializes every transition of one session.
pub struct SessionHandle {
    pub session: Mutex<QuizSession>,
    pub preview: Debouncer<ExecuteSqlResponse>,
}

/// In-memory sessions. Nothing survives a restart.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
    preview_delay: Duration,
}

impl SessionStore {
    pub fn new(preview_delay: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            preview_delay,
        }
    }

    pub async fn create(&self, session: QuizSession) -> (Uuid, Arc<SessionHandle>) {
        let id = Uuid::new_v4();
        let handle = Arc::new(SessionHandle {
            session: Mutex::new(session),
            preview: Debouncer::new(self.preview_delay),
        });
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        tracing::info!("Session {} started", id);
        (id, handle)
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<SessionHandle>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    /// Drops a finished session.
    pub async fn remove(&self, id: Uuid) {
        if let Some(handle) = self.sessions.write().await.remove(&id) {
            handle.preview.reset().await;
            tracing::info!("Session {} discarded", id);
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
