// SPDX-License-Identifier: GPL-3.0-only

//! Keeps the rendered page in sync with the daemon
//!
//! The controller owns the latest snapshot and the current selection.
//! Every change (new snapshot, new selection, finished action) re-renders
//! all regions at once and publishes the result on a watch channel.
//!
//! Volume groups that report `NeedsPolling` get a background task calling
//! `Poll` on them; it runs while such a group is shown and is stopped
//! before anything else is selected. Outside a tokio runtime the group is
//! shown without polling.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::Serialize;
use storage_contracts::{SnapshotSource, StorageDaemon};
use storage_types::StorageSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::dispatch::{Dispatcher, Location, Outcome, Request};
use crate::error::DetailsError;
use crate::render::{RenderedView, Selection, render};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Period of `Poll` calls on groups that need polling
    pub poll_interval: Duration,

    /// Include the jobs region
    pub show_jobs: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            show_jobs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    Hidden,

    /// The selected object does not exist (header "Not found", empty regions)
    NotFound { selection: Selection },

    Shown {
        selection: Selection,
        view: Box<RenderedView>,
    },
}

/// How a failed action is reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Next to the dialog field, the dialog stays open
    Inline { message: String },

    /// Modal error with the daemon's message
    Blocking { title: String, message: String },
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Inline { message } | Self::Blocking { message, .. } => message,
        }
    }
}

impl From<DetailsError> for Notice {
    fn from(error: DetailsError) -> Self {
        match error {
            DetailsError::Validation(e) => Self::Inline {
                message: e.to_string(),
            },
            DetailsError::Remote(e) => Self::Blocking {
                title: "Error".to_string(),
                message: e.message,
            },
        }
    }
}

struct PollTask {
    vgroup: String,
    handle: JoinHandle<()>,
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct DetailController<D: ?Sized> {
    dispatcher: Dispatcher<D>,
    config: ControllerConfig,
    snapshot: StorageSnapshot,
    selection: Option<Selection>,
    poll: Option<PollTask>,
    state: watch::Sender<ViewState>,
}

impl<D: StorageDaemon + ?Sized + 'static> DetailController<D> {
    pub fn new(daemon: Arc<D>, config: ControllerConfig, snapshot: StorageSnapshot) -> Self {
        let (state, _) = watch::channel(ViewState::Hidden);
        Self {
            dispatcher: Dispatcher::new(daemon),
            config,
            snapshot,
            selection: None,
            poll: None,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> &StorageSnapshot {
        &self.snapshot
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Group currently being polled
    pub fn polling(&self) -> Option<&str> {
        self.poll.as_ref().map(|p| p.vgroup.as_str())
    }

    pub fn show(&mut self, selection: Selection) {
        self.stop_polling();
        tracing::debug!("Showing {selection}");
        self.selection = Some(selection);
        self.render();
    }

    pub fn hide(&mut self) {
        self.stop_polling();
        self.selection = None;
        self.render();
    }

    /// Re-render from a new snapshot
    pub fn refresh(&mut self, snapshot: StorageSnapshot) {
        self.snapshot = snapshot;
        self.render();
    }

    /// Run an action against the current snapshot.
    ///
    /// Navigation requested by the action is applied before returning, on
    /// the snapshot the action ran against. A renamed group is therefore
    /// not found until the next [`DetailController::refresh`]; use
    /// [`DetailController::perform_and_reload`] to avoid that.
    pub async fn perform(&mut self, request: Request) -> Result<Outcome, Notice> {
        let result = self.dispatcher.execute(&self.snapshot, &request).await;
        self.finish(&request, result)
    }

    /// [`DetailController::perform`], then reload from `source` before
    /// navigating and re-rendering.
    ///
    /// A failed reload keeps the previous snapshot.
    pub async fn perform_and_reload<S>(
        &mut self,
        source: &S,
        request: Request,
    ) -> Result<Outcome, Notice>
    where
        S: SnapshotSource + ?Sized,
    {
        let result = self.dispatcher.execute(&self.snapshot, &request).await;
        if result.is_ok() {
            match source.snapshot().await {
                Ok(snapshot) => self.snapshot = snapshot,
                Err(e) => tracing::warn!("Failed to reload storage objects: {e}"),
            }
        }
        let navigated = matches!(result, Ok(Outcome::Navigate(_)));
        let outcome = self.finish(&request, result);
        if outcome.is_ok() && !navigated {
            self.render();
        }
        outcome
    }

    fn finish(
        &mut self,
        request: &Request,
        result: Result<Outcome, DetailsError>,
    ) -> Result<Outcome, Notice> {
        match result {
            Ok(Outcome::Navigate(location)) => {
                match &location {
                    Location::Overview => self.hide(),
                    Location::VolumeGroup(name) => {
                        self.show(Selection::VolumeGroup(name.clone()))
                    }
                }
                Ok(Outcome::Navigate(location))
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if e.is_validation() {
                    tracing::debug!("{} rejected: {e}", request.action.name());
                } else {
                    tracing::error!("{} failed: {e}", request.action.name());
                }
                Err(e.into())
            }
        }
    }

    /// Reload and re-render on every item of `changes` until it ends.
    ///
    /// A failed reload keeps the previous snapshot.
    pub async fn follow<S, C>(&mut self, source: &S, mut changes: C)
    where
        S: SnapshotSource + ?Sized,
        C: Stream + Unpin,
    {
        while changes.next().await.is_some() {
            match source.snapshot().await {
                Ok(snapshot) => self.refresh(snapshot),
                Err(e) => tracing::warn!("Failed to reload storage objects: {e}"),
            }
        }
        tracing::debug!("Change stream ended");
    }

    fn render(&mut self) {
        let Some(selection) = self.selection.clone() else {
            self.state.send_replace(ViewState::Hidden);
            return;
        };

        let Some(mut view) = render(&self.snapshot, &selection) else {
            self.stop_polling();
            self.state.send_replace(ViewState::NotFound { selection });
            return;
        };

        self.update_polling(&selection);
        if !self.config.show_jobs {
            view.jobs.clear();
        }
        self.state.send_replace(ViewState::Shown {
            selection,
            view: Box::new(view),
        });
    }

    fn update_polling(&mut self, selection: &Selection) {
        let needs = match selection {
            Selection::VolumeGroup(name) => self
                .snapshot
                .volume_group_by_name(name)
                .filter(|vg| vg.needs_polling)
                .map(|vg| vg.path.clone()),
            _ => None,
        };

        match needs {
            Some(vgroup) if self.polling() != Some(vgroup.as_str()) => {
                self.stop_polling();
                self.start_polling(vgroup);
            }
            Some(_) => {}
            None => self.stop_polling(),
        }
    }

    fn start_polling(&mut self, vgroup: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, not polling {vgroup}");
            return;
        };
        tracing::debug!("Polling {vgroup} every {:?}", self.config.poll_interval);
        let daemon = Arc::clone(self.dispatcher.daemon());
        let period = self.config.poll_interval;
        let target = vgroup.clone();

        let handle = runtime.spawn(async move {
            let mut tick = tokio::time::interval(period);
            // The first tick completes immediately
            tick.tick().await;
            loop {
                tick.tick().await;
                if let Err(e) = daemon.vg_poll(&target).await {
                    tracing::debug!("Poll of {target} failed: {e}");
                }
            }
        });

        self.poll = Some(PollTask { vgroup, handle });
    }

    fn stop_polling(&mut self) {
        if let Some(poll) = self.poll.take() {
            tracing::debug!("Stopped polling {}", poll.vgroup);
        }
    }
}
