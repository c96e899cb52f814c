use crate::foundation::core::Fps;
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::{
    AudioBuffer, AudioBuffers, AudioTrackInfo, MediaInput, MediaOpener, VideoFrame, VideoFrames,
    VideoTrackInfo,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Sample frames per decoded audio buffer.
const AUDIO_CHUNK_FRAMES: usize = 4096;

/// Stream metadata reported by `ffprobe`.
#[derive(Clone, Debug)]
pub struct ProbeInfo {
    /// Path that was probed.
    pub source_path: PathBuf,
    /// Native length in seconds (video stream when known, container otherwise).
    pub duration: f64,
    /// Primary video stream.
    pub video: Option<VideoTrackInfo>,
    /// Average frame rate of the primary video stream.
    pub fps: Option<Fps>,
    /// Primary audio stream.
    pub audio: Option<AudioTrackInfo>,
}

/// Probe stream metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_media(source_path: &Path) -> MergeResult<ProbeInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
        r_frame_rate: Option<String>,
        sample_rate: Option<String>,
        channels: Option<u16>,
        start_time: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| MergeError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(MergeError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| MergeError::decode(format!("ffprobe json parse failed: {e}")))?;

    let secs = |s: &Option<String>| s.as_deref().and_then(|v| v.parse::<f64>().ok());

    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let (video, fps, video_duration) = match video_stream {
        Some(s) => {
            let width = s
                .width
                .ok_or_else(|| MergeError::decode("missing video width from ffprobe"))?;
            let height = s
                .height
                .ok_or_else(|| MergeError::decode("missing video height from ffprobe"))?;
            let fps = s
                .avg_frame_rate
                .as_deref()
                .and_then(parse_rational_fps)
                .or_else(|| s.r_frame_rate.as_deref().and_then(parse_rational_fps));
            let info = VideoTrackInfo {
                width,
                height,
                first_timestamp: secs(&s.start_time).unwrap_or(0.0).max(0.0),
            };
            (Some(info), fps, secs(&s.duration))
        }
        None => (None, None, None),
    };

    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .and_then(|s| {
            let sample_rate = s.sample_rate.as_deref()?.parse::<u32>().ok()?;
            Some(AudioTrackInfo {
                sample_rate,
                channels: s.channels?,
                first_timestamp: secs(&s.start_time).unwrap_or(0.0).max(0.0),
            })
        });

    let duration = video_duration
        .or_else(|| parsed.format.as_ref().and_then(|f| secs(&f.duration)))
        .unwrap_or(0.0);

    Ok(ProbeInfo {
        source_path: source_path.to_path_buf(),
        duration,
        video,
        fps,
        audio,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe stream metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_media(_source_path: &Path) -> MergeResult<ProbeInfo> {
    Err(MergeError::decode(
        "decoding clip sources requires the 'media-ffmpeg' feature",
    ))
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    crate::encode::ffmpeg::tool_on_path("ffprobe")
}

/// Parse an ffprobe rate such as `"30000/1001"`.
pub fn parse_rational_fps(s: &str) -> Option<Fps> {
    let (num, den) = s.split_once('/').unwrap_or((s, "1"));
    Fps::new(num.trim().parse().ok()?, den.trim().parse().ok()?).ok()
}

/// [`MediaOpener`] that decodes through the system `ffprobe`/`ffmpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegOpener;

impl MediaOpener for FfmpegOpener {
    fn open(&self, source: &Path) -> MergeResult<Box<dyn MediaInput>> {
        let info = probe_media(source)?;
        Ok(Box::new(FfmpegInput { info }))
    }
}

struct FfmpegInput {
    info: ProbeInfo,
}

impl FfmpegInput {
    fn decode_cmd(&self, first_timestamp: f64, start: f64, end: f64) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-v",
            "error",
            "-ss",
            format!("{:.9}", (start - first_timestamp).max(0.0)).as_str(),
        ])
        .arg("-i")
        .arg(&self.info.source_path)
        .args(["-t", format!("{:.9}", (end - start).max(0.0)).as_str()]);
        cmd
    }
}

impl MediaInput for FfmpegInput {
    fn video_track(&self) -> Option<VideoTrackInfo> {
        self.info.video
    }

    fn audio_track(&self) -> Option<AudioTrackInfo> {
        self.info.audio
    }

    fn duration(&self) -> f64 {
        self.info.duration
    }

    fn video_frames(&mut self, start: f64, end: f64) -> MergeResult<VideoFrames<'_>> {
        let video = self
            .info
            .video
            .ok_or_else(|| MergeError::decode("source has no video stream"))?;
        let fps = self.info.fps.unwrap_or_default();
        let mut cmd = self.decode_cmd(video.first_timestamp, start, end);
        cmd.args([
            "-an",
            "-vf",
            format!("fps={}/{}", fps.num, fps.den).as_str(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ]);
        let pipe = DecodePipe::spawn(cmd, &self.info.source_path)?;
        let max_frames = ((end - start) * fps.as_f64() - 1e-9).ceil().max(0.0) as u64;

        Ok(Box::new(FfmpegVideoFrames {
            pipe,
            done: false,
            idx: 0,
            max_frames,
            start,
            fps,
            width: video.width,
            height: video.height,
        }))
    }

    fn audio_buffers(&mut self, start: f64, end: f64) -> MergeResult<AudioBuffers<'_>> {
        let audio = self
            .info
            .audio
            .ok_or_else(|| MergeError::decode("source has no audio stream"))?;
        let mut cmd = self.decode_cmd(audio.first_timestamp, start, end);
        cmd.args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            audio.channels.to_string().as_str(),
            "-ar",
            audio.sample_rate.to_string().as_str(),
            "pipe:1",
        ]);
        let pipe = DecodePipe::spawn(cmd, &self.info.source_path)?;

        Ok(Box::new(FfmpegAudioBuffers {
            pipe,
            done: false,
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            scratch: vec![0u8; AUDIO_CHUNK_FRAMES * usize::from(audio.channels) * 4],
        }))
    }
}

/// A running `ffmpeg` decode writing raw samples to stdout. Killed when dropped.
struct DecodePipe {
    child: Child,
    stdout: ChildStdout,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    source: PathBuf,
}

impl DecodePipe {
    fn spawn(mut cmd: Command, source: &Path) -> MergeResult<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| {
            MergeError::decode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MergeError::decode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MergeError::decode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });
        Ok(Self {
            child,
            stdout,
            stderr_drain: Some(stderr_drain),
            source: source.to_path_buf(),
        })
    }

    /// Fill `buf` as far as possible; returns the byte count, short only at end of stream.
    fn read_full(&mut self, buf: &mut [u8]) -> MergeResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.stdout.read(&mut buf[filled..]).map_err(|e| {
                MergeError::decode(format!(
                    "failed reading decoded data for '{}': {e}",
                    self.source.display()
                ))
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Wait for the decoder to exit and surface its failure, if any.
    fn finish(&mut self) -> MergeResult<()> {
        let status = self
            .child
            .wait()
            .map_err(|e| MergeError::decode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MergeError::decode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| MergeError::decode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(MergeError::decode(format!(
                "ffmpeg decode failed for '{}' ({status}): {}",
                self.source.display(),
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for DecodePipe {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

struct FfmpegVideoFrames {
    pipe: DecodePipe,
    done: bool,
    idx: u64,
    max_frames: u64,
    start: f64,
    fps: Fps,
    width: u32,
    height: u32,
}

impl Iterator for FfmpegVideoFrames {
    type Item = MergeResult<VideoFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.idx >= self.max_frames {
            self.done = true;
            return None;
        }

        let frame_len = (self.width as usize) * (self.height as usize) * 4;
        let mut data = vec![0u8; frame_len];
        let n = match self.pipe.read_full(&mut data) {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if n == 0 {
            self.done = true;
            return self.pipe.finish().err().map(Err);
        }
        if n < frame_len {
            self.done = true;
            return Some(Err(MergeError::decode(format!(
                "truncated video frame: got {n} of {frame_len} bytes"
            ))));
        }

        let timestamp = self.start + self.fps.frames_to_secs(self.idx);
        self.idx += 1;
        Some(Ok(VideoFrame {
            timestamp,
            duration: self.fps.frame_duration_secs(),
            width: self.width,
            height: self.height,
            data,
        }))
    }
}

struct FfmpegAudioBuffers {
    pipe: DecodePipe,
    done: bool,
    sample_rate: u32,
    channels: u16,
    scratch: Vec<u8>,
}

impl Iterator for FfmpegAudioBuffers {
    type Item = MergeResult<AudioBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let n = match self.pipe.read_full(&mut self.scratch) {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let frame_bytes = usize::from(self.channels) * 4;
        let usable = n - n % frame_bytes;
        if usable == 0 {
            self.done = true;
            return self.pipe.finish().err().map(Err);
        }

        let interleaved = self.scratch[..usable]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Some(AudioBuffer::new(self.sample_rate, self.channels, interleaved))
    }
}
