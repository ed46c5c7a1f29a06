//! Event-stream protocol consumer
//!
//! Reassembles the server's chunked event stream into frames and applies
//! them, in arrival order, to the display surface and the hit accumulator.

pub mod dispatch;
pub mod frame;
pub mod utf8;
