//! Audio format resolution and normalization.

pub(crate) mod config;
pub(crate) mod normalize;
pub(crate) mod resample;
