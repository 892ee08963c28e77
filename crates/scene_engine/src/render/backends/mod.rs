//! Graphics backend implementations
//!
//! Contains implementations of the collaborator traits in
//! [`crate::render::api`]. The headless backend records commands without
//! a GPU and is used by the demo application and the frame-orchestration
//! tests; real GPU backends plug into the same seam.

pub mod headless;

pub use headless::{HeadlessBackend, HeadlessSurface, RecordedCommand};
