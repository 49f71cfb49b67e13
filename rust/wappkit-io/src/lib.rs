//! Stream abstractions over owned OS-level resources:
//! - `Stream`: a file or anonymous memory stream with explicit and automatic close,
//!   positional read/write/seek primitives and line/contents readers.
//! - `TemporaryStream`: a read/write binary stream over memory that may spill to disk.
//!
//! Every failure is reported as a `wappkit_common::Error`.

pub mod handle;
pub mod metadata;
pub mod mode;
pub mod spill;
pub mod stream;
pub mod target;
pub mod temporary;


pub use std::io::SeekFrom;

pub use metadata::StreamMetadata;
pub use mode::OpenMode;
pub use stream::Stream;
pub use target::Target;
pub use temporary::{TemporaryStream, TemporaryStreamOptions};
