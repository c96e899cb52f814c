//! Output track writing.
//!
//! Sinks consume composited frames and normalized audio in timeline order. The
//! [`crate::TrackMultiplexer`] sits in front of a sink and enforces ordering and format invariants.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
pub(crate) mod mux;
/// Generic sink trait and built-in sinks.
pub mod sink;
