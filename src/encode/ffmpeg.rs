use crate::encode::sink::{MuxConfig, MuxSink};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::AudioBuffer;
use crate::render::compositor::OutputFrame;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

const GRID_EPS: f64 = 1e-9;
const PAD_TO_EVEN: &str = "pad=ceil(iw/2)*2:ceil(ih/2)*2";

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Also write the encoded MP4 here on success.
    pub out_path: Option<PathBuf>,
    /// Overwrite `out_path` if it already exists.
    pub overwrite: bool,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: Some(out_path.into()),
            ..Self::default()
        }
    }
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            out_path: None,
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Maps variable-timestamp frames onto a constant-rate slot grid.
///
/// Slot `k` starts at `k / fps` and shows the latest frame whose timestamp is not after it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CfrGrid {
    fps: Fps,
    next_slot: u64,
}

impl CfrGrid {
    pub(crate) fn new(fps: Fps) -> Self {
        Self { fps, next_slot: 0 }
    }

    /// Advance past every slot starting before `t`; return how many were passed.
    pub(crate) fn advance_to(&mut self, t: f64) -> u64 {
        let mut n = 0;
        while self.fps.frames_to_secs(self.next_slot) < t - GRID_EPS {
            self.next_slot += 1;
            n += 1;
        }
        n
    }
}

struct Spool {
    dir: tempfile::TempDir,
    video: BufWriter<File>,
    audio: BufWriter<File>,
    video_frames: u64,
    audio_frames: u64,
}

struct HeldFrame {
    end: f64,
    data: Vec<u8>,
}

/// Sink that spools raw frames and PCM to a temporary directory and encodes an H.264/AAC MP4
/// with the system `ffmpeg` when finished.
///
/// Frames are placed on the constant `fps` grid from [`MuxConfig`]: a frame is repeated for every
/// slot it covers, and frames shorter than a slot may be skipped.
///
/// yuv420p needs even dimensions, so an odd canvas is padded by one row or column of black on the
/// right or bottom edge of the encoded picture.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    cfg: Option<MuxConfig>,
    spool: Option<Spool>,
    grid: Option<CfrGrid>,
    held: Option<HeldFrame>,
}

impl FfmpegSink {
    /// Create a new sink.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            cfg: None,
            spool: None,
            grid: None,
            held: None,
        }
    }

    fn spool_mut(&mut self) -> MergeResult<&mut Spool> {
        self.spool
            .as_mut()
            .ok_or_else(|| MergeError::encode("ffmpeg sink not started"))
    }

    fn write_held(&mut self, repeats: u64) -> MergeResult<()> {
        if repeats == 0 {
            return Ok(());
        }
        let Some(held) = self.held.as_ref() else {
            return Ok(());
        };
        let spool = self
            .spool
            .as_mut()
            .ok_or_else(|| MergeError::encode("ffmpeg sink not started"))?;
        for _ in 0..repeats {
            spool
                .video
                .write_all(&held.data)
                .map_err(|e| MergeError::encode(format!("failed to spool video frame: {e}")))?;
        }
        spool.video_frames += repeats;
        Ok(())
    }
}

impl MuxSink for FfmpegSink {
    fn begin(&mut self, cfg: &MuxConfig) -> MergeResult<()> {
        if let Some(out) = self.opts.out_path.as_ref()
            && !self.opts.overwrite
            && out.exists()
        {
            return Err(MergeError::encode(format!(
                "output file '{}' already exists",
                out.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(MergeError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let dir = tempfile::Builder::new()
            .prefix("clipmerge-")
            .tempdir()
            .map_err(|e| MergeError::encode(format!("failed to create spool directory: {e}")))?;
        let open = |name: &str| {
            File::create(dir.path().join(name))
                .map(BufWriter::new)
                .map_err(|e| MergeError::encode(format!("failed to create spool file {name}: {e}")))
        };
        let video = open("video.rgba")?;
        let audio = open("audio.f32le")?;

        debug!(dir = %dir.path().display(), "spooling ffmpeg input");
        self.spool = Some(Spool {
            dir,
            video,
            audio,
            video_frames: 0,
            audio_frames: 0,
        });
        self.grid = Some(CfrGrid::new(cfg.fps));
        self.held = None;
        self.cfg = Some(*cfg);
        Ok(())
    }

    fn push_video(&mut self, frame: &OutputFrame<'_>) -> MergeResult<()> {
        let grid = self
            .grid
            .as_mut()
            .ok_or_else(|| MergeError::encode("ffmpeg sink not started"))?;
        let repeats = grid.advance_to(frame.timestamp);
        self.write_held(repeats)?;

        let mut data = match self.held.take() {
            Some(h) if h.data.len() == frame.data.len() => h.data,
            _ => vec![0u8; frame.data.len()],
        };
        flatten_straight_over_bg(&mut data, frame.data, self.opts.bg_rgba)?;
        self.held = Some(HeldFrame {
            end: frame.timestamp + frame.duration,
            data,
        });
        Ok(())
    }

    fn push_audio(&mut self, buf: &AudioBuffer) -> MergeResult<()> {
        let spool = self.spool_mut()?;
        let mut bytes = Vec::<u8>::with_capacity(buf.interleaved.len() * 4);
        for &sample in &buf.interleaved {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        spool
            .audio
            .write_all(&bytes)
            .map_err(|e| MergeError::encode(format!("failed to spool audio: {e}")))?;
        spool.audio_frames += buf.frames() as u64;
        Ok(())
    }

    fn finish(&mut self) -> MergeResult<Vec<u8>> {
        let cfg = self
            .cfg
            .ok_or_else(|| MergeError::encode("ffmpeg sink not started"))?;
        if let Some(end) = self.held.as_ref().map(|h| h.end) {
            let repeats = self
                .grid
                .as_mut()
                .map(|g| g.advance_to(end))
                .unwrap_or(0);
            self.write_held(repeats)?;
        }
        self.held = None;

        let mut spool = self
            .spool
            .take()
            .ok_or_else(|| MergeError::encode("ffmpeg sink not started"))?;
        spool
            .video
            .flush()
            .and_then(|_| spool.audio.flush())
            .map_err(|e| MergeError::encode(format!("failed to flush spool: {e}")))?;
        if spool.video_frames == 0 {
            return Err(MergeError::encode("no video frames were written"));
        }

        let dir = spool.dir.path();
        let mp4 = dir.join("out.mp4");
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
        ])
        .arg(dir.join("video.rgba"));
        if spool.audio_frames > 0 {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &cfg.audio.sample_rate.to_string(),
                "-ac",
                &cfg.audio.channels.to_string(),
                "-i",
            ])
            .arg(dir.join("audio.f32le"))
            .args(["-c:a", "aac"]);
        } else {
            cmd.arg("-an");
        }
        if let Some(filter) = even_pad_filter(cfg.canvas) {
            debug!(width = cfg.canvas.width, height = cfg.canvas.height, "padding odd canvas");
            cmd.args(["-vf", filter]);
        }
        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&mp4);

        let out = cmd.output().map_err(|e| {
            MergeError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        if !out.status.success() {
            return Err(MergeError::encode(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let bytes = std::fs::read(&mp4)
            .map_err(|e| MergeError::encode(format!("failed to read encoded output: {e}")))?;
        if let Some(path) = self.opts.out_path.as_ref() {
            ensure_parent_dir(path)?;
            std::fs::write(path, &bytes).map_err(|e| {
                MergeError::encode(format!("failed to write '{}': {e}", path.display()))
            })?;
        }
        self.cfg = None;
        self.grid = None;
        Ok(bytes)
    }

    fn cancel(&mut self) {
        // Dropping the spool removes the temporary directory.
        self.spool = None;
        self.held = None;
        self.grid = None;
        self.cfg = None;
    }
}

fn flatten_straight_over_bg(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) -> MergeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(MergeError::encode(
            "flatten_straight_over_bg expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for i in 0..3 {
            let c = mul_div255(u16::from(s[i]), a) + mul_div255(u16::from(bg_rgba[i]), inv);
            d[i] = c.min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Filter that rounds an odd canvas up to even dimensions, or `None` when it already is even.
pub(crate) fn even_pad_filter(canvas: Canvas) -> Option<&'static str> {
    if canvas.width.is_multiple_of(2) && canvas.height.is_multiple_of(2) {
        None
    } else {
        Some(PAD_TO_EVEN)
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MergeResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            MergeError::encode(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

pub(crate) fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
