use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::curriculum::Curriculum;
use crate::scheduler::{ProgressiveScheduler, SchedulerBuilder};
use crate::session::DrillSession;
use crate::store::{ProgressStore, StoreResult};

/// Produces the scheduler builder for an identity. The snapshot is attached by
/// the session after loading.
pub type SchedulerFactory = Arc<dyn Fn(&str) -> SchedulerBuilder + Send + Sync>;

/// Live sessions keyed by learner identity.
///
/// Each identity's snapshot is loaded exactly once, before its session accepts
/// any answer. [`switch_to`](Self::switch_to) implements single-learner clients:
/// every other session is discarded without a flush.
pub struct SessionRegistry {
    store: Arc<dyn ProgressStore>,
    factory: SchedulerFactory,
    save_debounce: Duration,
    sessions: Mutex<HashMap<String, Arc<DrillSession>>>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        curriculum: Curriculum,
        config: SchedulerConfig,
        save_debounce: Duration,
    ) -> Self {
        let factory: SchedulerFactory = Arc::new(move |_identity: &str| {
            ProgressiveScheduler::builder(curriculum.clone()).config(config.clone())
        });
        Self::with_factory(store, factory, save_debounce)
    }

    pub fn with_factory(
        store: Arc<dyn ProgressStore>,
        factory: SchedulerFactory,
        save_debounce: Duration,
    ) -> Self {
        Self {
            store,
            factory,
            save_debounce,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the identity's session, loading it on first use.
    pub async fn session(&self, identity: &str) -> StoreResult<Arc<DrillSession>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(identity) {
            return Ok(Arc::clone(session));
        }

        let builder = (self.factory)(identity);
        let session = Arc::new(
            DrillSession::open(
                identity,
                Arc::clone(&self.store),
                builder,
                self.save_debounce,
            )
            .await?,
        );
        sessions.insert(identity.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Makes `identity` the only live session. Sessions for other identities
    /// are discarded, including any save still waiting out its debounce.
    pub async fn switch_to(&self, identity: &str) -> StoreResult<Arc<DrillSession>> {
        {
            let mut sessions = self.sessions.lock().await;
            let stale: Vec<String> = sessions
                .keys()
                .filter(|key| key.as_str() != identity)
                .cloned()
                .collect();
            for key in stale {
                if let Some(session) = sessions.remove(&key) {
                    session.discard();
                    info!(from = %key, to = %identity, "switching learner identity");
                }
            }
        }
        self.session(identity).await
    }

    /// Drops the identity's session without saving. Returns whether one existed.
    pub async fn discard(&self, identity: &str) -> bool {
        match self.sessions.lock().await.remove(identity) {
            Some(session) => {
                session.discard();
                true
            }
            None => false,
        }
    }

    pub async fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        identities.sort();
        identities
    }

    /// Saves every live session now. Stops at the first failure.
    pub async fn flush_all(&self) -> StoreResult<()> {
        let sessions: Vec<Arc<DrillSession>> =
            self.sessions.lock().await.values().cloned().collect();
        for session in sessions {
            session.flush().await?;
        }
        Ok(())
    }
}
