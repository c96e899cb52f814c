//! Clip model and per-clip playback planning.

pub(crate) mod clip;
