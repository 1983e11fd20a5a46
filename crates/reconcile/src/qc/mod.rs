//! Quality-control sweep over one capture batch.
//!
//! Four stages run in order: [`validate`] the capture envelope, [`detect`]
//! issues in its positions, [`plan_fixes`] and persist the repairs, then
//! re-detect to verify. The stages are pure; [`QualityControl`] drives them
//! against the store and cache.

mod detect;
mod fix;
mod issues;
mod locks;
mod pipeline;
mod validate;

pub use detect::{BALANCE_TOLERANCE, PERCENTAGE_TOLERANCE, detect, detect_position};
pub use fix::{FixOutcome, FixResult, apply_fixes, apply_patch, plan_fixes};
pub use issues::{IssueType, PositionRef, QcIssue};
pub use locks::CaptureLocks;
pub use pipeline::{QcReport, QualityControl};
pub use validate::{ValidationIssue, ValidationReport, validate};
