//! Claiss Processing Library
//!
//! Compute and persistence orchestration for scene videos: the remote
//! compute client, the local renderer process, the storage-then-disk
//! persistence chain, and the compilation and merge orchestrators built on
//! top of them.

pub mod compilation;
pub mod compute;
pub mod error;
pub mod extract;
pub mod merge;
pub mod persist;
pub mod renderer;

pub use compilation::{CompilationOrchestrator, CompilationSettings};
pub use compute::{ComputeService, RemoteComputeClient, RemoteMerge, RemoteRender};
pub use error::{ComputeError, MergeError, PersistError, RenderError};
pub use extract::{extract_scene_code, scene_class_name, SceneCode};
pub use merge::{validate_scenes, MergeOrchestrator, MergeOutcome, MergeRequest};
pub use persist::{PersistedVideo, StorageTier, VideoPersister};
pub use renderer::{LocalRender, LocalRenderer, Renderer};
