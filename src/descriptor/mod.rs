//! Package descriptor module
//!
//! Models the static installation metadata for a script-based utility:
//! the descriptor itself, its declared runtime requirements, and the
//! validation that decides whether there is anything to install.

mod manifest;
mod requirement;

pub use manifest::{Manifest, ManifestIssue};
pub use requirement::Requirement;
