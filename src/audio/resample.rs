use crate::foundation::error::{MergeError, MergeResult};

/// Sample-rate converter for interleaved `f32` PCM.
///
/// Implementations may keep state between calls so that consecutive buffers of one stream join
/// without discontinuities. [`Resampler::reset`] marks the start of a new stream.
pub trait Resampler: Send {
    /// Forget any state carried from previous buffers.
    fn reset(&mut self);

    /// Convert `input` (interleaved, `channels` wide) from `input_rate` to `output_rate`.
    fn process(
        &mut self,
        input: &[f32],
        channels: u16,
        input_rate: u32,
        output_rate: u32,
    ) -> MergeResult<Vec<f32>>;
}

/// Streaming linear-interpolation resampler.
///
/// Carries the fractional read position and the last input frame across calls, so splitting a
/// stream into buffers does not change the output.
#[derive(Debug, Clone, Default)]
pub struct LinearResampler {
    // Read position relative to the start of the next input buffer, in input frames. `-1.0..0.0`
    // addresses the interval between `prev` and the first frame of the next buffer.
    position: f64,
    prev: Vec<f32>,
    format: Option<(u32, u32, u16)>,
}

impl LinearResampler {
    /// Create a resampler with no carried state.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn interpolate(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

impl Resampler for LinearResampler {
    fn reset(&mut self) {
        self.position = 0.0;
        self.prev.clear();
        self.format = None;
    }

    fn process(
        &mut self,
        input: &[f32],
        channels: u16,
        input_rate: u32,
        output_rate: u32,
    ) -> MergeResult<Vec<f32>> {
        if input_rate == 0 || output_rate == 0 {
            return Err(MergeError::resample(format!(
                "invalid sample rate conversion {input_rate} -> {output_rate}"
            )));
        }
        let ch = usize::from(channels);
        if ch == 0 || !input.len().is_multiple_of(ch) {
            return Err(MergeError::resample(format!(
                "buffer of {} samples does not divide into {channels} channels",
                input.len()
            )));
        }
        if input_rate == output_rate {
            return Ok(input.to_vec());
        }
        if self.format != Some((input_rate, output_rate, channels)) {
            self.reset();
            self.format = Some((input_rate, output_rate, channels));
        }

        let frames = input.len() / ch;
        if frames == 0 {
            return Ok(Vec::new());
        }
        let step = f64::from(input_rate) / f64::from(output_rate);
        let est = ((frames as f64) / step).ceil() as usize + 1;
        let mut out = Vec::with_capacity(est * ch);

        let mut pos = self.position;
        loop {
            let base = pos.floor();
            let i0 = base as isize;
            let i1 = i0 + 1;
            if i1 >= frames as isize {
                break;
            }
            let frac = (pos - base) as f32;
            for c in 0..ch {
                let s0 = if i0 < 0 {
                    self.prev.get(c).copied().unwrap_or(input[c])
                } else {
                    input[i0 as usize * ch + c]
                };
                let s1 = input[i1 as usize * ch + c];
                out.push(Self::interpolate(s0, s1, frac));
            }
            pos += step;
        }

        self.position = pos - frames as f64;
        self.prev.clear();
        self.prev.extend_from_slice(&input[(frames - 1) * ch..]);
        Ok(out)
    }
}

const C: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Per-channel (left, right) gains for folding a standard surround layout into stereo.
///
/// Layouts follow the usual channel order: 3.0 is FL FR FC, 5.0 is FL FR FC BL BR, 5.1 adds LFE
/// after FC, and 7.1 appends SL SR. LFE is dropped. Gains are not yet normalized.
fn stereo_fold_gains(src: usize) -> Option<&'static [(f32, f32)]> {
    const L: (f32, f32) = (1.0, 0.0);
    const R: (f32, f32) = (0.0, 1.0);
    const CENTRE: (f32, f32) = (C, C);
    const LFE: (f32, f32) = (0.0, 0.0);
    const SIDE_L: (f32, f32) = (C, 0.0);
    const SIDE_R: (f32, f32) = (0.0, C);
    match src {
        3 => Some(&[L, R, CENTRE]),
        5 => Some(&[L, R, CENTRE, SIDE_L, SIDE_R]),
        6 => Some(&[L, R, CENTRE, LFE, SIDE_L, SIDE_R]),
        8 => Some(&[L, R, CENTRE, LFE, SIDE_L, SIDE_R, SIDE_L, SIDE_R]),
        _ => None,
    }
}

fn fold_to_stereo(frame: &[f32], gains: &[(f32, f32)]) -> (f32, f32) {
    let norm: f32 = gains.iter().map(|g| g.0).sum();
    let (l, r) = frame
        .iter()
        .zip(gains)
        .fold((0.0f32, 0.0f32), |(l, r), (&s, &(gl, gr))| (l + s * gl, r + s * gr));
    (l / norm, r / norm)
}

/// Convert interleaved PCM between channel layouts.
///
/// Known surround layouts (3.0, 5.0, 5.1, 7.1) fold into stereo with the centre and surrounds
/// at -3 dB on both sides and LFE dropped; a mono target takes the mean of that stereo fold.
/// Other downmixes make output channel `c` the mean of every input channel `j` with
/// `j % dst == c`. Upmixing copies input channel `c % src`, so mono fans out to every output.
pub fn remix_interleaved(input: &[f32], src_channels: u16, dst_channels: u16) -> MergeResult<Vec<f32>> {
    let src = usize::from(src_channels);
    let dst = usize::from(dst_channels);
    if src == 0 || dst == 0 {
        return Err(MergeError::resample(format!(
            "cannot remix {src_channels} -> {dst_channels} channels"
        )));
    }
    if !input.len().is_multiple_of(src) {
        return Err(MergeError::resample(
            "remix input length is not a multiple of the channel count",
        ));
    }
    if src == dst {
        return Ok(input.to_vec());
    }

    let frames = input.len() / src;
    let mut out = vec![0.0f32; frames * dst];
    let surround = if dst <= 2 { stereo_fold_gains(src) } else { None };
    for (src_frame, dst_frame) in input.chunks_exact(src).zip(out.chunks_exact_mut(dst)) {
        if let Some(gains) = surround {
            let (l, r) = fold_to_stereo(src_frame, gains);
            if dst == 2 {
                dst_frame[0] = l;
                dst_frame[1] = r;
            } else {
                dst_frame[0] = 0.5 * (l + r);
            }
        } else if src > dst {
            for (c, slot) in dst_frame.iter_mut().enumerate() {
                let mut sum = 0.0f32;
                let mut n = 0u32;
                for j in (c..src).step_by(dst) {
                    sum += src_frame[j];
                    n += 1;
                }
                *slot = sum / n as f32;
            }
        } else {
            for (c, slot) in dst_frame.iter_mut().enumerate() {
                *slot = src_frame[c % src];
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/resample.rs"]
mod tests;
