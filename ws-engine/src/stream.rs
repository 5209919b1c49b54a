//! Byte transports consumed by the WebSocket engine.
//!
//! Each side of a duplex transport is used by a single operation at a time, so reading and
//! writing are separate capabilities implemented by separate halves.

mod bytes_stream;
mod std;
mod stream_reader;
mod stream_writer;
#[cfg(feature = "tokio")]
mod tokio;

pub use bytes_stream::BytesStream;
pub use stream_reader::StreamReader;
pub use stream_writer::StreamWriter;
