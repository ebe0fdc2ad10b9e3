//! # pdfdesk-storage
//!
//! Filesystem side of a job. Uploads land in `uploads/` as input artifacts
//! that delete themselves when dropped; results go to `outputs/` where they
//! stay until the retention sweeper or an explicit delete removes them.
//! Converters get a scratch directory under `work/`.

pub mod archive;
pub mod artifact;
pub mod store;

pub use archive::{ArchiveEntry, ArchiveSource};
pub use artifact::{InputArtifact, InputWriter, OutputArtifact, WorkDir};
pub use store::ArtifactStore;
