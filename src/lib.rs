//! Support layer for firmware update tools: a diagnostic channel that speaks either plain text or
//! a length-prefixed framing protocol, error reporting on top of it, the exit handshake used by
//! supervising processes, and page-aligned buffers for direct I/O.

pub mod alloc;
pub mod handshake;
pub mod hexstr;
pub(crate) mod macros;
pub mod output;
pub mod pretty;
pub mod report;
pub mod resource;
pub mod timestamp;

pub use output::{FrameType, Output, OutputMode};
pub use report::{Context, Fatal};
