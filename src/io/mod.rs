//! Streaming I/O with memory mapped buffers
//!
//! The buffer lifecycle follows the kernel's order:
//! `REQBUFS -> QUERYBUF -> mmap -> QBUF -> STREAMON -> (DQBUF, QBUF)* -> STREAMOFF -> munmap ->
//! REQBUFS(0)`.

pub mod arena;
pub mod stream;

pub use arena::Arena;
pub use stream::{Frame, Stream};
