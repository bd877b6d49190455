use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::Recording;
use crate::{BrowserDriver, DriverError, DriverEvent, EventStream, PageSetup, PerformanceTiming};

#[derive(Debug, Default)]
struct ReplayState {
    sender: Option<mpsc::UnboundedSender<DriverEvent>>,
    playback: Option<JoinHandle<()>>,
    navigated: bool,
    closed: bool,
    injected_scripts: usize,
}

/// Driver that replays a [`Recording`] instead of loading a live page.
#[derive(Debug)]
pub struct ReplayDriver {
    recording: Arc<Recording>,
    state: Mutex<ReplayState>,
}

impl ReplayDriver {
    pub fn new(recording: Recording) -> Self {
        Self {
            recording: Arc::new(recording),
            state: Mutex::new(ReplayState::default()),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let recording = Recording::load(path)?;
        tracing::info!(
            target: "loadtrace_driver",
            path = %path.display(),
            events = recording.events.len(),
            "recording loaded"
        );
        Ok(Self::new(recording))
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    pub fn injected_scripts(&self) -> usize {
        self.state.lock().injected_scripts
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.state.lock().closed {
            return Err(DriverError::Closed);
        }
        Ok(())
    }
}

async fn play(recording: Arc<Recording>, sender: mpsc::UnboundedSender<DriverEvent>) {
    let started = Instant::now();
    let origin = recording.origin();
    for event in &recording.events {
        let Some(due) = started.checked_add(Recording::playback_offset(event, origin)) else {
            tracing::warn!(
                target: "loadtrace_driver",
                timestamp = event.timestamp,
                "event lies beyond the playback horizon; stopping playback"
            );
            return;
        };
        tokio::time::sleep_until(due).await;
        if sender.send(event.clone()).is_err() {
            tracing::debug!(target: "loadtrace_driver", "subscriber dropped; stopping playback");
            return;
        }
    }
    tracing::debug!(
        target: "loadtrace_driver",
        events = recording.events.len(),
        "playback finished"
    );
}

#[async_trait]
impl BrowserDriver for ReplayDriver {
    fn name(&self) -> &'static str {
        "replay"
    }

    async fn preload(&self, url: &str, _setup: &PageSetup) -> Result<(), DriverError> {
        self.ensure_open()?;
        tracing::info!(
            target: "loadtrace_driver",
            url = %url,
            "cache warm-up has no effect on a recording"
        );
        Ok(())
    }

    async fn prepare(&self, setup: &PageSetup) -> Result<(), DriverError> {
        self.ensure_open()?;
        tracing::info!(
            target: "loadtrace_driver",
            device = %setup.device,
            download_mbps = setup.network.download_mbps,
            upload_mbps = setup.network.upload_mbps,
            latency_ms = setup.network.latency_ms,
            user_agent = setup.user_agent_override().unwrap_or("<real>"),
            "page setup recorded; replay keeps captured timings"
        );
        Ok(())
    }

    async fn subscribe(&self) -> Result<EventStream, DriverError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DriverError::Closed);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.sender = Some(tx);
        Ok(rx)
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        if let Some(recorded) = self.recording.page_url.as_deref() {
            if recorded != url {
                tracing::warn!(
                    target: "loadtrace_driver",
                    requested = %url,
                    recorded = %recorded,
                    "navigating to a different url than the recording captured"
                );
            }
        }

        let mut state = self.state.lock();
        if state.closed {
            return Err(DriverError::Closed);
        }
        if state.navigated {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "a recording can only be replayed once".to_string(),
            });
        }
        state.navigated = true;

        match state.sender.clone() {
            Some(sender) => {
                tracing::info!(
                    target: "loadtrace_driver",
                    url = %url,
                    events = self.recording.events.len(),
                    "starting playback"
                );
                state.playback = Some(tokio::spawn(play(Arc::clone(&self.recording), sender)));
            }
            None => {
                tracing::warn!(
                    target: "loadtrace_driver",
                    url = %url,
                    "navigated without a subscriber; events are discarded"
                );
            }
        }
        Ok(())
    }

    async fn inject_script(&self, source: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DriverError::Closed);
        }
        if !state.navigated {
            return Err(DriverError::NotNavigated);
        }
        state.injected_scripts += 1;
        tracing::debug!(
            target: "loadtrace_driver",
            script_len = source.len(),
            "script injection recorded"
        );
        Ok(())
    }

    async fn performance_timing(&self) -> Result<PerformanceTiming, DriverError> {
        {
            let state = self.state.lock();
            if state.closed {
                return Err(DriverError::Closed);
            }
            if !state.navigated {
                return Err(DriverError::NotNavigated);
            }
        }
        self.recording
            .performance_timing
            .ok_or(DriverError::Unavailable("performance timing"))
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if let Some(playback) = state.playback.take() {
            playback.abort();
        }
        state.sender = None;
        if !state.closed {
            state.closed = true;
            tracing::info!(target: "loadtrace_driver", "replay driver closed");
        }
        Ok(())
    }
}
