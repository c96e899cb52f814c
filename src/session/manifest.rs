use crate::foundation::error::{MergeError, MergeResult};
use crate::session::opts::MergeOpts;
use crate::timeline::clip::Clip;
use std::path::Path;

/// A merge described as JSON: the ordered clip list plus [`MergeOpts`].
///
/// ```json
/// { "clips": [{ "source": "a.mp4", "target_duration": 4.0 }], "opts": { "fit": "letterbox" } }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeManifest {
    /// Clips in merge order.
    pub clips: Vec<Clip>,
    /// Output options; defaults apply when omitted.
    #[serde(default)]
    pub opts: MergeOpts,
}

impl MergeManifest {
    /// Load a manifest file. Relative clip sources are resolved against the file's directory.
    pub fn from_path(path: &Path) -> MergeResult<Self> {
        let f = std::fs::File::open(path).map_err(|e| {
            MergeError::input(format!("failed to open manifest '{}': {e}", path.display()))
        })?;
        let mut manifest: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .map_err(|e| {
                MergeError::input(format!("invalid manifest '{}': {e}", path.display()))
            })?;
        if let Some(base) = path.parent() {
            manifest.resolve_relative_to(base);
        }
        Ok(manifest)
    }

    /// Prefix every relative clip source with `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for clip in &mut self.clips {
            if clip.source.is_relative() {
                clip.source = base.join(&clip.source);
            }
        }
    }

    /// Checks that need no decoding: non-empty clip list, positive durations, valid options.
    pub fn validate(&self) -> MergeResult<()> {
        validate_clips(&self.clips)?;
        self.opts.validate()
    }
}

pub(crate) fn validate_clips(clips: &[Clip]) -> MergeResult<()> {
    if clips.is_empty() {
        return Err(MergeError::input("clip list is empty"));
    }
    for (i, clip) in clips.iter().enumerate() {
        clip.validate(i)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/manifest.rs"]
mod tests;
