//! Axon - TCP messaging and round-trip latency tool
//!
//! A server accepts many concurrent connections and acknowledges every
//! length-framed message it receives. A client sends messages, measures the
//! round-trip time of each acknowledgement, and can ping continuously while
//! aggregating latency statistics.

pub mod client;
pub mod logging;
pub mod net;
pub mod protocol;
pub mod server;
pub mod shutdown;
pub mod timing;
