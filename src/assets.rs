//! Animation assets shown on the selection screen.
//!
//! Each gender button is paired with a Lottie animation document.  Both files
//! are loaded once at startup; a missing or malformed file is fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::Gender;

/// Default animation for the "Male" button.
pub const DEFAULT_MALE_ANIMATION: &str = "Animation - 1749394556693.json";

/// Default animation for the "Female" button.
pub const DEFAULT_FEMALE_ANIMATION: &str = "Animation - 1749395326494.json";

/// The header fields of a Lottie document.
#[derive(Debug, Default, Deserialize)]
struct LottieHeader {
    #[serde(default, rename = "nm")]
    name: Option<String>,
    #[serde(default, rename = "w")]
    width: Option<f64>,
    #[serde(default, rename = "h")]
    height: Option<f64>,
    #[serde(default, rename = "fr")]
    frame_rate: Option<f64>,
    #[serde(default, rename = "ip")]
    in_point: Option<f64>,
    #[serde(default, rename = "op")]
    out_point: Option<f64>,
    #[serde(default)]
    layers: Vec<serde_json::Value>,
}

/// A parsed animation document.
#[derive(Debug, Clone)]
pub struct Animation {
    path: PathBuf,
    name: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    frame_rate: Option<f64>,
    frames: Option<f64>,
    layer_count: usize,
}

impl Animation {
    /// Loads an animation from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::asset(err.to_string(), path.display().to_string(), Some(Box::new(err)))
        })?;
        Self::parse(path, &content)
    }

    /// Parses an animation document; `path` is only used for reporting.
    pub fn parse<P: AsRef<Path>>(path: P, content: &str) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let document: serde_json::Value = serde_json::from_str(content).map_err(|err| {
            Error::asset(
                format!("invalid JSON: {err}"),
                label.clone(),
                Some(Box::new(err)),
            )
        })?;
        if !document.is_object() {
            return Err(Error::asset("not an animation document", label, None));
        }
        let header = LottieHeader::deserialize(&document).map_err(|err| {
            Error::asset(
                format!("invalid animation header: {err}"),
                label,
                Some(Box::new(err)),
            )
        })?;
        let frames = match (header.in_point, header.out_point) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        };
        Ok(Self {
            path: path.to_path_buf(),
            name: header.name,
            width: header.width,
            height: header.height,
            frame_rate: header.frame_rate,
            frames,
            layer_count: header.layers.len(),
        })
    }

    /// Where the animation was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The animation's own name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Width and height in pixels, when both are declared.
    pub fn size(&self) -> Option<(f64, f64)> {
        self.width.zip(self.height)
    }

    /// Frames per second.
    pub fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    /// Number of layers in the document.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Playback length, when the frame range and rate are declared.
    pub fn duration(&self) -> Option<Duration> {
        let frames = self.frames?;
        let rate = self.frame_rate.filter(|rate| *rate > 0.0)?;
        Some(Duration::from_secs_f64(frames / rate))
    }

    /// One-line description for the selection screen.
    pub fn summary(&self) -> String {
        let mut parts = vec![self.name().unwrap_or("untitled").to_string()];
        if let Some((width, height)) = self.size() {
            parts.push(format!("{width}x{height}"));
        }
        if let Some(duration) = self.duration() {
            parts.push(format!("{:.1}s", duration.as_secs_f64()));
        }
        parts.push(format!("{} layers", self.layer_count));
        parts.join(", ")
    }
}

/// The animations for both selection buttons.
#[derive(Debug, Clone)]
pub struct AnimationSet {
    male: Animation,
    female: Animation,
}

impl AnimationSet {
    /// Loads both animations, failing on the first that cannot be loaded.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(male: P, female: Q) -> Result<Self> {
        Ok(Self {
            male: Animation::load(male)?,
            female: Animation::load(female)?,
        })
    }

    /// Returns the animation shown next to `gender`'s button.
    pub fn for_gender(&self, gender: Gender) -> &Animation {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }
}
