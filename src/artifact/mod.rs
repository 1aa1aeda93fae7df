//! Audit artifact module
//!
//! Persists the statements generated for each staged file as `<TABLE>.sql` so a run can be
//! audited or replayed by hand. Artifacts are write-only: nothing reads them back.
//!
//! Writes go to a process-unique temporary file that is renamed over the target, so a
//! concurrent run never observes a torn artifact. Last writer wins.

mod writer;

pub use writer::{render_artifact, ArtifactWriter};
