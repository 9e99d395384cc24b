//! The medication tracker state machine.
//!
//! A `Tracker` owns one `SessionState` and mutates it through a small set of
//! operations. Each operation returns a `Transition` telling the renderer
//! whether anything changed and what to tell the user; rejections come back
//! as a `TrackerError` with a warning notice and leave the state untouched.
//! Everything the page shows is derived from the state on demand.

mod clock;
mod derive;
mod error;
mod notice;
mod state;
mod view;

#[cfg(test)]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};
pub use derive::daily_tip;
pub use error::TrackerError;
pub use notice::{Notice, NoticeLevel, Transition};
pub use state::{SessionState, Tracker};
pub use view::DashboardView;
