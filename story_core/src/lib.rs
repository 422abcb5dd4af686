//! # Story Core
//!
//! Runtime for interactive picture-book stories. Drives a child through the
//! pages of a [`story_content::Story`], launches the mini-games embedded in
//! pages, keeps score and achievements, and enforces the parental gate and
//! daily play-time budget.
//!
//! ## Core Components
//!
//! - **navigator**: Page navigation, choice gating by story flags, pacing timers
//! - **dispatcher**: Mini-game lifecycle plus the built-in headless games
//! - **progress**: Per-type statistics and achievements
//! - **parental**: PIN gate, settings and play-time limits
//! - **persistence**: Key-value storage and the remote profile mirror
//! - **session**: Composition root that wires the above together and routes events
//!
//! Everything is single-threaded. Components buffer [`StoryEvent`]s and the
//! session publishes them to observers in order.

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod navigator;
pub mod parental;
pub mod persistence;
pub mod progress;
pub mod scheduler;
pub mod session;

pub use clock::*;
pub use config::*;
pub use dispatcher::*;
pub use error::*;
pub use events::*;
pub use navigator::*;
pub use parental::*;
pub use persistence::*;
pub use progress::*;
pub use scheduler::*;
pub use session::*;
