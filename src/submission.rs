//! Per-click synthesis request
//!
//! A `Submission` is built once, when the user clicks Submit, and handed
//! by value to the worker thread. Nothing in it is shared with the UI.

use once_cell::sync::Lazy;
use std::fmt;
use std::path::PathBuf;

/// Lowest selectable speed, in tenths
const MIN_TENTHS: u8 = 4;
/// Highest selectable speed, in tenths
const MAX_TENTHS: u8 = 20;

/// Every speed offered by the selector, slowest first
static ALL_SPEEDS: Lazy<Vec<Speed>> =
    Lazy::new(|| (MIN_TENTHS..=MAX_TENTHS).map(Speed).collect());

/// Playback speed multiplier, restricted to 0.4..=2.0 in 0.1 steps
///
/// Stored as tenths so that equality and formatting are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Speed(u8);

impl Speed {
    /// Normal speed (1.0)
    pub const DEFAULT: Speed = Speed(10);

    /// Build a speed from tenths (4 = 0.4, 20 = 2.0)
    pub fn from_tenths(tenths: u8) -> Option<Self> {
        (MIN_TENTHS..=MAX_TENTHS)
            .contains(&tenths)
            .then_some(Speed(tenths))
    }

    /// Build a speed from a multiplier, accepting only enumerated values
    pub fn from_multiplier(multiplier: f32) -> Option<Self> {
        if !multiplier.is_finite() {
            return None;
        }
        let tenths = (multiplier * 10.0).round();
        if (tenths / 10.0 - multiplier).abs() > 1e-4 || !(0.0..=255.0).contains(&tenths) {
            return None;
        }
        Self::from_tenths(tenths as u8)
    }

    /// All selectable speeds in ascending order
    pub fn all() -> &'static [Speed] {
        &ALL_SPEEDS
    }

    pub fn tenths(self) -> u8 {
        self.0
    }

    /// The multiplier passed to the voice model
    pub fn multiplier(self) -> f32 {
        f32::from(self.0) / 10.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// One synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Text to speak (non-empty once validated)
    pub text: String,

    /// Directory the `.wav` file is written into
    pub output_directory: PathBuf,

    /// Requested speed
    pub speed: Speed,
}

impl Submission {
    pub fn new(text: impl Into<String>, output_directory: impl Into<PathBuf>, speed: Speed) -> Self {
        Self {
            text: text.into(),
            output_directory: output_directory.into(),
            speed,
        }
    }

    /// File name for this request: `<first word>_speed_<speed>.wav`
    ///
    /// The first word is everything before the first ASCII space, so a
    /// leading space gives an empty word. Path separators are replaced
    /// so the file cannot escape the output directory.
    pub fn output_file_name(&self) -> String {
        let first_word: String = self
            .text
            .split(' ')
            .next()
            .unwrap_or_default()
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();

        format!("{}_speed_{}.wav", first_word, self.speed)
    }

    /// Full destination path
    pub fn output_path(&self) -> PathBuf {
        self.output_directory.join(self.output_file_name())
    }
}
