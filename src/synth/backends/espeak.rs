//! espeak-ng backend
//!
//! Fallback for machines without MeloTTS. espeak-ng writes WAV output
//! itself (`-w`), so each synthesis is a single short-lived process.
//! There is one voice per language and no accelerator to choose.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)

use crate::synth::{Device, Language, LoadedModel, ModelLoader, SpeakerMap, VoiceModel};
use crate::{HablaError, Result};
use log::{debug, error};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Slowest rate espeak-ng accepts, in words per minute
const MIN_WPM: u16 = 80;
/// Fastest rate espeak-ng accepts, in words per minute
const MAX_WPM: u16 = 450;

/// Checks for espeak-ng and hands out models for it
pub struct EspeakLoader {
    /// Path to espeak-ng
    espeak_path: String,

    /// Words per minute at speed 1.0
    base_wpm: u16,
}

impl EspeakLoader {
    pub fn new(espeak_path: impl Into<String>, base_wpm: u16) -> Self {
        Self {
            espeak_path: espeak_path.into(),
            base_wpm,
        }
    }

    /// Verify the executable runs
    fn probe(&self) -> Result<()> {
        let status = Command::new(&self.espeak_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HablaError::Model(format!(
                "{} not found. Install with: sudo apt install espeak-ng",
                self.espeak_path
            ))),
        }
    }
}

impl ModelLoader for EspeakLoader {
    fn load(&self, language: Language, device: Device) -> Result<LoadedModel> {
        self.probe()?;
        debug!("espeak-ng ignores device preference {}", device);

        let mut speakers = SpeakerMap::new();
        speakers.insert(language.speaker_label().to_string(), 0);

        Ok(LoadedModel {
            model: Box::new(EspeakModel {
                espeak_path: self.espeak_path.clone(),
                voice: language.espeak_voice().to_string(),
                base_wpm: self.base_wpm,
            }),
            speakers,
        })
    }
}

/// espeak-ng configured for one language
pub struct EspeakModel {
    espeak_path: String,
    voice: String,
    base_wpm: u16,
}

impl EspeakModel {
    /// Convert a speed multiplier to espeak words per minute
    fn speed_to_wpm(base_wpm: u16, speed: f32) -> u16 {
        let wpm = (f32::from(base_wpm) * speed).round();
        wpm.clamp(f32::from(MIN_WPM), f32::from(MAX_WPM)) as u16
    }
}

impl VoiceModel for EspeakModel {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn tts_to_file(&mut self, text: &str, speaker_id: usize, path: &Path, speed: f32) -> Result<()> {
        if speaker_id != 0 {
            return Err(HablaError::Synthesis(format!(
                "espeak-ng has a single voice, got speaker {}",
                speaker_id
            )));
        }

        let wpm = Self::speed_to_wpm(self.base_wpm, speed);
        debug!("espeak-ng: voice {} at {} wpm -> {}", self.voice, wpm, path.display());

        // Text goes through stdin so it can't be mistaken for an option
        let mut child = Command::new(&self.espeak_path)
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(wpm.to_string())
            .arg("-w")
            .arg(path)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HablaError::Synthesis(format!("Failed to start espeak-ng: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("espeak-ng failed: {}", stderr.trim());
            return Err(HablaError::Synthesis(format!(
                "espeak-ng exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_conversion() {
        assert_eq!(EspeakModel::speed_to_wpm(175, 1.0), 175);
        assert_eq!(EspeakModel::speed_to_wpm(175, 0.5), 88);
        assert_eq!(EspeakModel::speed_to_wpm(175, 2.0), 350);
        assert_eq!(EspeakModel::speed_to_wpm(175, 0.4), 80); // Clamped to slowest
        assert_eq!(EspeakModel::speed_to_wpm(300, 2.0), 450); // Clamped to fastest
    }

    #[test]
    fn test_missing_executable() {
        let loader = EspeakLoader::new("habla-no-such-espeak", 175);
        let err = loader.load(Language::Es, Device::Auto).err().expect("load should fail");
        assert!(err.to_string().contains("habla-no-such-espeak"));
    }

    #[test]
    fn test_espeak_speaker_map() {
        match EspeakLoader::new("espeak-ng", 175).load(Language::Es, Device::Auto) {
            Ok(loaded) => {
                assert_eq!(loaded.speakers.len(), 1);
                assert_eq!(loaded.speaker_id("ES").unwrap(), 0);
            }
            Err(e) => println!("⚠ espeak-ng backend not available: {}", e),
        }
    }
}
