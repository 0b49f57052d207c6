use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{EditSelection, FeedbackId, FeedbackItem, FeedbackPatch, FeedbackStats, NewFeedback},
    protocol::ListFeedbackQuery,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};
use url::Url;

pub mod config;
pub mod confirm;
pub mod error;

pub use config::{load_settings, DeletePolicy, Settings};
pub use confirm::{AlwaysConfirm, Confirmer, FnConfirmer, NeverConfirm, DELETE_PROMPT};
pub use error::StoreError;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum StoreEvent {
    Loaded { count: usize },
    Added(FeedbackItem),
    Updated(FeedbackItem),
    Deleted(FeedbackId),
    EditSelected(FeedbackItem),
    EditCleared,
    Error(String),
}

#[derive(Debug)]
pub enum DeleteOutcome {
    /// The confirmer said no; nothing was sent.
    Declined,
    /// The request was issued and the local list no longer holds the id.
    /// `removed` is false when no local item had it; `remote_error` carries
    /// the failed request, if any.
    Removed {
        removed: bool,
        remote_error: Option<StoreError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSnapshot {
    pub items: Vec<FeedbackItem>,
    pub edit: EditSelection,
    pub is_loading: bool,
}

struct StoreState {
    items: Vec<FeedbackItem>,
    edit: EditSelection,
    is_loading: bool,
    load_started: bool,
}

/// In-memory mirror of the remote feedback collection.
///
/// Construct once and hand the `Arc` to every consumer. Local state changes
/// only after the matching request has completed; nothing is applied
/// optimistically.
pub struct FeedbackStore {
    http: Client,
    collection_url: Url,
    delete_policy: DeletePolicy,
    confirmer: Arc<dyn Confirmer>,
    inner: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl FeedbackStore {
    pub fn new(
        settings: &Settings,
        confirmer: Arc<dyn Confirmer>,
    ) -> Result<Arc<Self>, StoreError> {
        let collection_url = settings.collection_url()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Arc::new(Self {
            http: Client::new(),
            collection_url,
            delete_policy: settings.delete_policy,
            confirmer,
            inner: Mutex::new(StoreState {
                items: Vec::new(),
                edit: EditSelection::default(),
                is_loading: true,
                load_started: false,
            }),
            events,
        }))
    }

    /// Runs [`FeedbackStore::load`] on the current runtime.
    pub fn spawn_initial_load(self: &Arc<Self>) -> JoinHandle<Result<(), StoreError>> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.load().await })
    }

    /// Fetches the collection, newest first, and replaces the local list.
    ///
    /// Runs at most once per store. A failed load leaves the store empty and
    /// still loading.
    pub async fn load(&self) -> Result<(), StoreError> {
        {
            let mut guard = self.inner.lock().await;
            if guard.load_started {
                return Err(StoreError::LoadAlreadyStarted);
            }
            guard.load_started = true;
        }

        let items = self
            .fetch_all()
            .await
            .map_err(|err| self.report("load", err))?;
        let count = items.len();
        {
            let mut guard = self.inner.lock().await;
            guard.items = items;
            guard.is_loading = false;
        }

        info!(count, "feedback: initial load complete");
        let _ = self.events.send(StoreEvent::Loaded { count });
        Ok(())
    }

    pub async fn add(&self, new_feedback: NewFeedback) -> Result<FeedbackItem, StoreError> {
        let created = self
            .create_remote(&new_feedback)
            .await
            .map_err(|err| self.report("add", err))?;

        self.inner.lock().await.items.insert(0, created.clone());

        info!(id = %created.id, "feedback: added");
        let _ = self.events.send(StoreEvent::Added(created.clone()));
        Ok(created)
    }

    /// Replaces the record remotely, then merges the returned fields into the
    /// local copy. Returns the merged item, or `None` when no local item has
    /// that id.
    pub async fn update(
        &self,
        id: FeedbackId,
        patch: FeedbackPatch,
    ) -> Result<Option<FeedbackItem>, StoreError> {
        let returned = self
            .replace_remote(&id, &patch)
            .await
            .map_err(|err| self.report("update", err))?;

        let merged = {
            let mut guard = self.inner.lock().await;
            guard
                .items
                .iter_mut()
                .find(|item| item.id == id)
                .map(|item| {
                    item.apply(returned);
                    item.clone()
                })
        };

        match &merged {
            Some(item) => {
                info!(%id, "feedback: updated");
                let _ = self.events.send(StoreEvent::Updated(item.clone()));
            }
            None => warn!(%id, "feedback: updated remotely but not present locally"),
        }
        Ok(merged)
    }

    /// Deletes after the confirmer agrees.
    ///
    /// With [`DeletePolicy::AlwaysRemove`] the local item is dropped once the
    /// request finishes even if it failed; the failure is reported in the
    /// outcome. With [`DeletePolicy::RequireServerSuccess`] a failed request
    /// keeps the item and returns the error.
    pub async fn delete(&self, id: FeedbackId) -> Result<DeleteOutcome, StoreError> {
        if !self.confirmer.confirm(DELETE_PROMPT).await {
            debug!(%id, "feedback: delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let remote_error = match self.delete_remote(&id).await {
            Ok(()) => None,
            Err(err) => {
                let err = self.report("delete", err);
                if self.delete_policy == DeletePolicy::RequireServerSuccess {
                    return Err(err);
                }
                warn!(%id, "feedback: removing local copy despite failed delete");
                Some(err)
            }
        };

        let removed = {
            let mut guard = self.inner.lock().await;
            let before = guard.items.len();
            guard.items.retain(|item| item.id != id);
            guard.items.len() != before
        };
        if removed {
            info!(%id, "feedback: deleted");
            let _ = self.events.send(StoreEvent::Deleted(id));
        } else {
            debug!(%id, "feedback: delete issued for an id not held locally");
        }

        Ok(DeleteOutcome::Removed {
            removed,
            remote_error,
        })
    }

    pub async fn select_for_edit(&self, item: FeedbackItem) {
        self.inner.lock().await.edit = EditSelection::editing(item.clone());
        let _ = self.events.send(StoreEvent::EditSelected(item));
    }

    pub async fn clear_edit(&self) {
        self.inner.lock().await.edit = EditSelection::default();
        let _ = self.events.send(StoreEvent::EditCleared);
    }

    pub async fn find(&self, id: &FeedbackId) -> Option<FeedbackItem> {
        self.inner
            .lock()
            .await
            .items
            .iter()
            .find(|item| &item.id == id)
            .cloned()
    }

    pub async fn items(&self) -> Vec<FeedbackItem> {
        self.inner.lock().await.items.clone()
    }

    pub async fn edit_selection(&self) -> EditSelection {
        self.inner.lock().await.edit.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.is_loading
    }

    pub async fn snapshot(&self) -> FeedbackSnapshot {
        let guard = self.inner.lock().await;
        FeedbackSnapshot {
            items: guard.items.clone(),
            edit: guard.edit.clone(),
            is_loading: guard.is_loading,
        }
    }

    pub async fn stats(&self) -> FeedbackStats {
        FeedbackStats::from_items(&self.inner.lock().await.items)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    async fn fetch_all(&self) -> Result<Vec<FeedbackItem>, StoreError> {
        let url = &self.collection_url;
        let response = self
            .execute(Method::GET, url, |request| {
                request.query(&ListFeedbackQuery::newest_first())
            })
            .await?;
        read_json(Method::GET, url, response).await
    }

    async fn create_remote(&self, new_feedback: &NewFeedback) -> Result<FeedbackItem, StoreError> {
        let url = &self.collection_url;
        let response = self
            .execute(Method::POST, url, |request| request.json(new_feedback))
            .await?;
        read_json(Method::POST, url, response).await
    }

    async fn replace_remote(
        &self,
        id: &FeedbackId,
        patch: &FeedbackPatch,
    ) -> Result<FeedbackPatch, StoreError> {
        let url = self.item_url(id)?;
        let response = self
            .execute(Method::PUT, &url, |request| request.json(patch))
            .await?;
        read_json(Method::PUT, &url, response).await
    }

    async fn delete_remote(&self, id: &FeedbackId) -> Result<(), StoreError> {
        let url = self.item_url(id)?;
        self.execute(Method::DELETE, &url, |request| request).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        url: &Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, StoreError> {
        let response = build(self.http.request(method.clone(), url.clone()))
            .send()
            .await
            .map_err(|source| StoreError::NetworkFailure {
                method: method.clone(),
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::ServerRejected {
                method,
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    fn item_url(&self, id: &FeedbackId) -> Result<Url, StoreError> {
        let mut endpoint = self.collection_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(&id.to_string());
        Ok(endpoint)
    }

    fn report(&self, operation: &str, err: StoreError) -> StoreError {
        error!(operation, "feedback: {err}");
        let _ = self.events.send(StoreEvent::Error(format!("{operation}: {err}")));
        err
    }
}

async fn read_json<T: DeserializeOwned>(
    method: Method,
    url: &Url,
    response: Response,
) -> Result<T, StoreError> {
    let body = response
        .bytes()
        .await
        .map_err(|source| StoreError::NetworkFailure {
            method,
            url: url.to_string(),
            source,
        })?;
    serde_json::from_slice(&body).map_err(|source| StoreError::DecodeFailure {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
