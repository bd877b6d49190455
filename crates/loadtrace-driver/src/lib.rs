pub mod error;
pub mod event;
pub mod replay;
pub mod setup;
pub mod traits;

pub use error::DriverError;
pub use event::{DriverEvent, EventKind, PerformanceTiming};
pub use replay::{Recording, ReplayDriver};
pub use setup::{DeviceKind, NetworkCondition, PageSetup};
pub use traits::{BrowserDriver, EventStream};
