use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{DriverError, DriverEvent, PageSetup, PerformanceTiming};

/// Ordered stream of raw network events pushed by a driver.
pub type EventStream = mpsc::UnboundedReceiver<DriverEvent>;

/// The browser-side collaborator of a page-load session.
///
/// A driver owns the page: it applies device and network emulation,
/// navigates, injects scripts, and reports every network occurrence as a
/// [`DriverEvent`] over the stream handed out by [`BrowserDriver::subscribe`].
/// Events must be delivered in the order the driver observed them.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Visit `url` once so that a later navigation runs against a warm cache.
    async fn preload(&self, url: &str, setup: &PageSetup) -> Result<(), DriverError>;

    async fn prepare(&self, setup: &PageSetup) -> Result<(), DriverError>;

    /// Start delivering network events. Only the most recent subscriber receives events.
    async fn subscribe(&self) -> Result<EventStream, DriverError>;

    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn inject_script(&self, source: &str) -> Result<(), DriverError>;

    /// One-shot read of the navigation marks once the page is considered settled.
    async fn performance_timing(&self) -> Result<PerformanceTiming, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}
