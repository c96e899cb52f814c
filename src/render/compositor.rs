use crate::foundation::core::Canvas;
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::VideoFrame;
use crate::render::surface::{CpuSurface, FitMode, ScaleFilter, Surface, fit_rect};
use crate::timeline::clip::Segment;

/// A composited frame ready for the video track. Borrows the compositor's scratch surface.
#[derive(Clone, Copy, Debug)]
pub struct OutputFrame<'a> {
    /// Global output timestamp, seconds.
    pub timestamp: f64,
    /// Display duration, seconds.
    pub duration: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixels, `width * height * 4` bytes.
    pub data: &'a [u8],
}

/// Re-times decoded frames onto the output timeline and draws them into one reused surface.
pub struct FrameCompositor {
    surface: Box<dyn Surface>,
    fit: FitMode,
    background: [u8; 4],
}

impl FrameCompositor {
    /// Compositor drawing into a [`CpuSurface`] of `canvas` size.
    pub fn new(
        canvas: Canvas,
        fit: FitMode,
        filter: ScaleFilter,
        background: [u8; 4],
    ) -> MergeResult<Self> {
        let surface = CpuSurface::new(canvas, filter)?;
        Ok(Self::with_surface(Box::new(surface), fit, background))
    }

    /// Compositor drawing into a caller-supplied surface.
    pub fn with_surface(surface: Box<dyn Surface>, fit: FitMode, background: [u8; 4]) -> Self {
        Self {
            surface,
            fit,
            background,
        }
    }

    /// Output frame size.
    pub fn canvas(&self) -> Canvas {
        self.surface.canvas()
    }

    /// Draw `frame`, whose timestamp is `local` seconds after `segment.source_start`.
    ///
    /// The output frame is stamped at `segment.output_offset + local` and its duration is clipped
    /// to the segment's end.
    pub fn composite(
        &mut self,
        frame: &VideoFrame,
        local: f64,
        segment: &Segment,
    ) -> MergeResult<OutputFrame<'_>> {
        let expected = (frame.width as usize) * (frame.height as usize) * 4;
        if frame.width == 0 || frame.height == 0 || frame.data.len() != expected {
            return Err(MergeError::decode(format!(
                "decoded frame at {:.6}s has {} bytes for {}x{} RGBA",
                frame.timestamp,
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }

        let canvas = self.surface.canvas();
        let dst = fit_rect(frame.width, frame.height, canvas, self.fit);
        self.surface.clear(self.background);
        self.surface
            .draw_rgba(&frame.data, frame.width, frame.height, dst)?;

        let timestamp = segment.output_offset + local;
        let duration = frame.duration.min(segment.output_end() - timestamp).max(0.0);
        Ok(OutputFrame {
            timestamp,
            duration,
            width: canvas.width,
            height: canvas.height,
            data: self.surface.pixels(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
