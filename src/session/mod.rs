pub(crate) mod manifest;
pub(crate) mod merge;
pub(crate) mod opts;
pub(crate) mod progress;
