//! Frame re-timing and rasterization into the output canvas.

pub(crate) mod compositor;
pub(crate) mod surface;
