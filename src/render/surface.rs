use crate::foundation::core::Canvas;
use crate::foundation::error::{MergeError, MergeResult};
use image::{ImageBuffer, Rgba, RgbaImage, imageops};

/// How a source frame is placed on the output canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Stretch to exactly cover the canvas; aspect ratio is not preserved.
    #[default]
    Fill,
    /// Scale to fit inside the canvas preserving aspect ratio, centred, with background bars.
    Letterbox,
}

/// Resampling filter used when a frame has to be scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFilter {
    /// Nearest neighbour.
    Nearest,
    /// Linear.
    #[default]
    Triangle,
    /// Cubic.
    CatmullRom,
    /// Lanczos with window 3.
    Lanczos3,
}

impl ScaleFilter {
    fn to_image(self) -> imageops::FilterType {
        match self {
            Self::Nearest => imageops::FilterType::Nearest,
            Self::Triangle => imageops::FilterType::Triangle,
            Self::CatmullRom => imageops::FilterType::CatmullRom,
            Self::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Destination rectangle on a surface, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Where a `src_width`x`src_height` frame lands on `canvas` under `mode`.
pub fn fit_rect(src_width: u32, src_height: u32, canvas: Canvas, mode: FitMode) -> DrawRect {
    let full = DrawRect {
        x: 0,
        y: 0,
        width: canvas.width,
        height: canvas.height,
    };
    if mode == FitMode::Fill || src_width == 0 || src_height == 0 {
        return full;
    }

    // Compare aspect ratios with integer cross-multiplication to stay deterministic.
    let src_w = u64::from(src_width);
    let src_h = u64::from(src_height);
    let dst_w = u64::from(canvas.width);
    let dst_h = u64::from(canvas.height);
    if src_w * dst_h >= dst_w * src_h {
        let h = ((dst_w * src_h + src_w / 2) / src_w).clamp(1, dst_h) as u32;
        DrawRect {
            x: 0,
            y: (canvas.height - h) / 2,
            width: canvas.width,
            height: h,
        }
    } else {
        let w = ((dst_h * src_w + src_h / 2) / src_h).clamp(1, dst_w) as u32;
        DrawRect {
            x: (canvas.width - w) / 2,
            y: 0,
            width: w,
            height: canvas.height,
        }
    }
}

/// A fixed-size RGBA8 target that frames are drawn into.
pub trait Surface: Send {
    /// Size of the surface.
    fn canvas(&self) -> Canvas;

    /// Fill the whole surface with `rgba`.
    fn clear(&mut self, rgba: [u8; 4]);

    /// Draw a tightly packed RGBA8 image scaled into `dst`, replacing what was there.
    fn draw_rgba(&mut self, src: &[u8], src_width: u32, src_height: u32, dst: DrawRect)
    -> MergeResult<()>;

    /// Current pixels, tightly packed RGBA8, row-major.
    fn pixels(&self) -> &[u8];
}

/// CPU surface backed by an [`image::RgbaImage`].
pub struct CpuSurface {
    image: RgbaImage,
    filter: ScaleFilter,
}

impl CpuSurface {
    /// Create a transparent surface of `canvas` size.
    pub fn new(canvas: Canvas, filter: ScaleFilter) -> MergeResult<Self> {
        canvas.validate()?;
        Ok(Self {
            image: RgbaImage::new(canvas.width, canvas.height),
            filter,
        })
    }
}

impl Surface for CpuSurface {
    fn canvas(&self) -> Canvas {
        Canvas {
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.image.pixels_mut() {
            *px = Rgba(rgba);
        }
    }

    fn draw_rgba(
        &mut self,
        src: &[u8],
        src_width: u32,
        src_height: u32,
        dst: DrawRect,
    ) -> MergeResult<()> {
        let view = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(src_width, src_height, src)
            .ok_or_else(|| {
                MergeError::decode(format!(
                    "frame buffer of {} bytes is too small for {src_width}x{src_height} RGBA",
                    src.len()
                ))
            })?;
        if dst.x + dst.width > self.image.width() || dst.y + dst.height > self.image.height() {
            return Err(MergeError::encode("draw rectangle exceeds surface bounds"));
        }

        if src_width == dst.width && src_height == dst.height {
            imageops::replace(&mut self.image, &view, i64::from(dst.x), i64::from(dst.y));
        } else {
            let scaled = imageops::resize(&view, dst.width, dst.height, self.filter.to_image());
            imageops::replace(&mut self.image, &scaled, i64::from(dst.x), i64::from(dst.y));
        }
        Ok(())
    }

    fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
