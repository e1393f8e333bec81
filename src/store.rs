//! Read-through cache of the tag-scoped resource collection.
//!
//! The store is the single source of truth for both the grid and the
//! viewer. All mutations go through `append`/`invalidate`; nothing else
//! touches the cached list, so a fetch happens at most once per
//! invalidation cycle and torn reads are impossible on the one UI thread.

use std::sync::mpsc;

use crate::cloudinary::{api::ApiClient, resource::Resource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// The last fetch failed; the gallery renders this with a retry button.
    Failed(String),
}

pub struct ResourceStore {
    tag: Option<String>,
    resources: Vec<Resource>,
    state: LoadState,
    stale: bool,
    tx: mpsc::SyncSender<Result<Vec<Resource>, String>>,
    rx: mpsc::Receiver<Result<Vec<Resource>, String>>,
}

impl ResourceStore {
    pub fn new(tag: Option<String>) -> Self {
        let (tx, rx) = mpsc::sync_channel(4);
        Self {
            tag,
            resources: Vec::new(),
            state: LoadState::Idle,
            stale: true,
            tx,
            rx,
        }
    }

    /// Drain fetch results delivered by worker threads.
    pub fn poll(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(resources) => {
                    tracing::info!(count = resources.len(), "resource listing loaded");
                    self.resources = resources;
                    self.state = LoadState::Ready;
                }
                Err(message) => {
                    tracing::warn!(%message, "resource listing failed");
                    self.state = LoadState::Failed(message);
                }
            }
        }
    }

    /// Kick off a background fetch if the cache is stale and no fetch is in
    /// flight. A failed fetch stays failed until `invalidate` is called; the
    /// store never retries on its own.
    pub fn ensure_fresh(&mut self, api: &ApiClient, ctx: &egui::Context) {
        if !self.stale || self.state == LoadState::Loading {
            return;
        }
        self.stale = false;
        self.state = LoadState::Loading;

        let api = api.clone();
        let tag = self.tag.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = api
                .list_resources(tag.as_deref())
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    /// Prepend new resources, dropping any cached entry with the same
    /// public id, and mark the cache for a refresh on the next read.
    pub fn append(&mut self, new: Vec<Resource>) {
        if new.is_empty() {
            return;
        }
        for resource in new.into_iter().rev() {
            self.resources
                .retain(|cached| cached.public_id != resource.public_id);
            self.resources.insert(0, resource);
        }
        self.stale = true;
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn find_by_asset_id(&self, asset_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.asset_id == asset_id)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }
}
