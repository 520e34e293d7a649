//! Data models shared by the storage, processing and API crates.

mod compilation;
mod scene;
mod storage;

pub use compilation::*;
pub use scene::*;
pub use storage::*;
