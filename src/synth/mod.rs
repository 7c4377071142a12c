//! Voice model abstraction
//!
//! The actual text-to-speech work is done by an external model. This
//! module describes what Habla needs from it: a loader parameterized by
//! language and device that yields a model plus its speaker map, and a
//! model that can synthesize text straight to a file.

pub mod backends;

use crate::config::Config;
use crate::{HablaError, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use backends::espeak::EspeakLoader;
use backends::melo::MeloLoader;

/// Speaker label -> model-internal voice index
pub type SpeakerMap = HashMap<String, usize>;

/// Languages the voice models are asked to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    Es,
    En,
    Fr,
    Zh,
    Jp,
    Kr,
}

impl Language {
    /// Language code understood by MeloTTS
    pub fn code(self) -> &'static str {
        match self {
            Language::Es => "ES",
            Language::En => "EN",
            Language::Fr => "FR",
            Language::Zh => "ZH",
            Language::Jp => "JP",
            Language::Kr => "KR",
        }
    }

    /// Speaker label selected for this language
    ///
    /// Every language ships one voice except English, which has several
    /// accents; American English is used there.
    pub fn speaker_label(self) -> &'static str {
        match self {
            Language::En => "EN-US",
            other => other.code(),
        }
    }

    /// espeak-ng voice name
    pub fn espeak_voice(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en-us",
            Language::Fr => "fr",
            Language::Zh => "cmn",
            Language::Jp => "ja",
            Language::Kr => "ko",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ES" => Ok(Language::Es),
            "EN" => Ok(Language::En),
            "FR" => Ok(Language::Fr),
            "ZH" => Ok(Language::Zh),
            "JP" => Ok(Language::Jp),
            "KR" => Ok(Language::Kr),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Compute device preference handed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// Let the model pick an accelerator, falling back to CPU
    #[default]
    Auto,
    Cpu,
    Cuda,
    Mps,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Mps => "mps",
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            "mps" => Ok(Device::Mps),
            other => Err(format!("unknown device '{}'", other)),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend `create_loader` should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// MeloTTS first, espeak-ng if it can't be loaded
    #[default]
    Auto,
    Melo,
    Espeak,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "melo" | "melotts" => Ok(BackendKind::Melo),
            "espeak" | "espeak-ng" => Ok(BackendKind::Espeak),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// A loaded voice model
///
/// Synthesis is blocking; callers run it off the UI thread.
pub trait VoiceModel: Send {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Synthesize `text` with the given voice and write a WAV file to `path`
    ///
    /// An existing file at `path` is overwritten.
    fn tts_to_file(&mut self, text: &str, speaker_id: usize, path: &Path, speed: f32) -> Result<()>;
}

/// Result of loading a voice model
pub struct LoadedModel {
    pub model: Box<dyn VoiceModel>,
    pub speakers: SpeakerMap,
}

impl LoadedModel {
    /// Voice index for a speaker label
    pub fn speaker_id(&self, label: &str) -> Result<usize> {
        self.speakers.get(label).copied().ok_or_else(|| {
            HablaError::Model(format!(
                "Speaker '{}' not offered by {} (have: {})",
                label,
                self.model.name(),
                self.speaker_labels().join(", ")
            ))
        })
    }

    fn speaker_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.speakers.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }
}

/// Loads voice models
///
/// Called once per synthesis job; implementations don't cache.
pub trait ModelLoader: Send + Sync {
    fn load(&self, language: Language, device: Device) -> Result<LoadedModel>;
}

/// Loader that picks a backend according to configuration
///
/// In `auto` mode MeloTTS is tried first on every load, and espeak-ng is
/// used when Melo can't be started.
pub struct BackendLoader {
    kind: BackendKind,
    melo: MeloLoader,
    espeak: EspeakLoader,
}

impl BackendLoader {
    pub fn new(kind: BackendKind, melo: MeloLoader, espeak: EspeakLoader) -> Self {
        Self { kind, melo, espeak }
    }
}

impl ModelLoader for BackendLoader {
    fn load(&self, language: Language, device: Device) -> Result<LoadedModel> {
        match self.kind {
            BackendKind::Melo => self.melo.load(language, device),
            BackendKind::Espeak => self.espeak.load(language, device),
            BackendKind::Auto => {
                info!("Trying MeloTTS backend...");
                match self.melo.load(language, device) {
                    Ok(loaded) => {
                        info!("✓ MeloTTS model loaded");
                        return Ok(loaded);
                    }
                    Err(e) => warn!("✗ MeloTTS unavailable: {}", e),
                }

                info!("Trying espeak-ng backend...");
                self.espeak.load(language, device).map_err(|e| {
                    HablaError::Model(format!(
                        "No voice model available. Tried:\n\
                         1. MeloTTS (install: pip install melotts)\n\
                         2. espeak-ng (install: sudo apt install espeak-ng)\n\
                         Error: {}",
                        e
                    ))
                })
            }
        }
    }
}

/// Create the model loader described by the configuration
pub fn create_loader(config: &Config) -> Result<Arc<dyn ModelLoader>> {
    let kind = config.backend()?;
    info!("Synthesis backend: {:?}", kind);

    let melo = MeloLoader::new(config.python());
    let espeak = EspeakLoader::new(config.espeak_path(), config.espeak_base_wpm()?);

    Ok(Arc::new(BackendLoader::new(kind, melo, espeak)))
}
