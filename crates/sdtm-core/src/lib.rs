//! Study-level orchestration: dependency scheduling and parallel derivation.
//!
//! [`schedule`] orders the requested domains so every domain follows its
//! dependencies, and [`StudyPipeline`] derives them wave by wave.

pub mod error;
pub mod pipeline;
pub mod scheduler;

pub use error::{PipelineError, ScheduleError};
pub use pipeline::{DEFAULT_WORKERS, StudyPipeline, StudyRun};
pub use scheduler::{Schedule, schedule};
