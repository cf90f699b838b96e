//! Async coordinator around the match state.
//!
//! A single owner task holds the [`DashboardMatchState`] and applies actions
//! in the order they arrive on its channel. Coordinator methods call the
//! backends and report their outcomes as actions; readers observe the state
//! through a `watch` channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::catalog::Catalog;
use crate::embeddings::{rank, EmbeddingCache, RankOutcome, TextEmbedder};
use crate::llm::{summarize_all, TextGenerator};
use crate::state::{reduce, Action, DashboardMatchState, StatePatch};

/// External capabilities a session works with
#[derive(Clone)]
pub struct SessionBackends {
    pub catalog: Arc<dyn Catalog>,
    pub embedder: Arc<dyn TextEmbedder>,
    pub generator: Arc<dyn TextGenerator>,
    pub cache: Arc<EmbeddingCache>,
}

/// An action plus, for query results, the query generation it belongs to
struct Envelope {
    action: Action,
    generation: Option<u64>,
    applied: oneshot::Sender<DashboardMatchState>,
}

pub struct MatchSession {
    backends: SessionBackends,
    top_k: usize,
    actions: mpsc::UnboundedSender<Envelope>,
    state: watch::Receiver<DashboardMatchState>,
    generation: Arc<AtomicU64>,
}

impl MatchSession {
    /// Start a session. Must be called from within a tokio runtime.
    pub fn new(backends: SessionBackends, top_k: usize) -> Self {
        let (actions, mut inbox) = mpsc::unbounded_channel::<Envelope>();
        let (publisher, state) = watch::channel(DashboardMatchState::default());
        let generation = Arc::new(AtomicU64::new(0));
        let latest = generation.clone();

        tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                let superseded = envelope
                    .generation
                    .is_some_and(|g| g != latest.load(Ordering::SeqCst));
                if superseded {
                    tracing::debug!("dropping results of superseded query");
                } else {
                    let action = envelope.action;
                    publisher.send_modify(|state| {
                        *state = reduce(std::mem::take(state), action);
                    });
                }
                let _ = envelope.applied.send(publisher.borrow().clone());
            }
        });

        Self {
            backends,
            top_k,
            actions,
            state,
            generation,
        }
    }

    /// Apply an action and return the state right after it
    pub async fn dispatch(&self, action: Action) -> DashboardMatchState {
        self.send(action, None).await
    }

    /// Like `dispatch`, but the owner task drops the action if `generation`
    /// is no longer the latest query by the time it is dequeued
    async fn send(&self, action: Action, generation: Option<u64>) -> DashboardMatchState {
        let (applied, done) = oneshot::channel();
        let envelope = Envelope {
            action,
            generation,
            applied,
        };
        if self.actions.send(envelope).is_err() {
            return self.snapshot();
        }
        done.await.unwrap_or_else(|_| self.snapshot())
    }

    pub fn snapshot(&self) -> DashboardMatchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardMatchState> {
        self.state.clone()
    }

    /// Load (or build) the embedded corpus into state
    pub async fn load_embeddings(&self) -> DashboardMatchState {
        self.dispatch(Action::EmbeddingsLoad).await;

        let loaded = self
            .backends
            .cache
            .load_corpus(
                self.backends.catalog.as_ref(),
                self.backends.embedder.as_ref(),
            )
            .await;

        match loaded {
            Ok(corpus) => {
                self.dispatch(Action::EmbeddingsReady {
                    embeddings: Arc::new(corpus),
                })
                .await
            }
            Err(e) => {
                tracing::warn!(error = %e, "loading embeddings failed");
                self.dispatch(Action::EmbeddingsFail).await
            }
        }
    }

    /// Rank the loaded corpus against `query` and summarize the winners.
    ///
    /// If a newer query starts before this one finishes, this one's results
    /// are dropped.
    pub async fn find_matches(&self, query: &str) -> DashboardMatchState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.send(Action::SetState(StatePatch::query(query)), Some(generation))
            .await;
        let state = self.send(Action::MatchesLoad, Some(generation)).await;
        let corpus = state.embeddings;

        let outcome = rank(
            query,
            &corpus,
            self.top_k,
            self.backends.embedder.as_ref(),
        )
        .await;

        let action = match outcome {
            RankOutcome::Ranked(results) => {
                if self.is_stale(generation) {
                    return self.discard(query);
                }
                let matches = summarize_all(results, self.backends.generator.as_ref()).await;
                Action::MatchesComplete { matches }
            }
            RankOutcome::QueryEmbeddingFailed(reason) => {
                tracing::warn!(%query, %reason, "query embedding failed");
                Action::MatchesFail
            }
        };

        self.send(action, Some(generation)).await
    }

    /// Select a dashboard and resolve its full record
    pub async fn select_dashboard(&self, id: &str) -> DashboardMatchState {
        self.dispatch(Action::SetSelectedDashboardId { id: id.to_string() })
            .await;

        match self.backends.catalog.fetch_dashboard(id).await {
            Ok(dashboard) => {
                self.dispatch(Action::SetState(StatePatch::current_dashboard(dashboard)))
                    .await
            }
            Err(e) => {
                tracing::warn!(dashboard_id = %id, error = %e, "could not load dashboard");
                self.dispatch(Action::FailToFindDashboard).await
            }
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn discard(&self, query: &str) -> DashboardMatchState {
        tracing::debug!(%query, "dropping results of superseded query");
        self.snapshot()
    }
}
