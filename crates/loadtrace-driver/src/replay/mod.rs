//! Playback of a previously captured page load.
//!
//! A [`Recording`] is the JSON form of everything a live driver would have
//! reported for one navigation. [`ReplayDriver`] feeds it back through the
//! [`BrowserDriver`](crate::BrowserDriver) seam with the captured pacing, so a
//! session behaves as it would against a real page.

pub mod driver;
pub mod recording;

pub use driver::ReplayDriver;
pub use recording::Recording;
