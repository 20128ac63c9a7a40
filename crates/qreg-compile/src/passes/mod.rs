//! Built-in compilation passes.
//!
//! - [`TimelineAnalysis`]: publishes per-version overwrite/last-use positions
//! - [`ConstraintEnforcement`]: repairs stale reads and self-duplication
//! - [`SafetyVerification`]: fails compilation on any remaining violation

pub mod enforce;
pub mod timeline;
pub mod verify;

pub use enforce::{ConstraintEnforcement, EnforcementReport, enforce};
pub use timeline::{RegisterTimeline, SlotLifetime, TimelineAnalysis};
pub use verify::{SafetyVerification, VerificationReport, Violation, check_constraints};
