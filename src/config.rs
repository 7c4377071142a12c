//! Configuration management
//!
//! Habla reads an optional INI file from the user's config directory
//! (`~/.config/habla/habla.cfg` on Linux). The file is never written: the
//! window's own selections are not persisted between sessions.

use crate::synth::{BackendKind, Device, Language};
use crate::{HablaError, Result};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_ESPEAK: &str = "espeak-ng";
const DEFAULT_BASE_WPM: u16 = 175;

/// Startup settings for the synthesis backends
pub struct Config {
    /// INI storage (empty when no file exists)
    ini: Ini,

    /// Where the file was looked for
    path: PathBuf,
}

impl Config {
    /// Load configuration from the default location, or use defaults
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            info!("No config file at {:?}, using defaults", path);
            Ok(Self {
                ini: Ini::new(),
                path,
            })
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let ini = Ini::load_from_file(path)
            .map_err(|e| HablaError::IniParse(format!("Failed to load config: {}", e)))?;

        let config = Self {
            ini,
            path: path.to_path_buf(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from INI text (no file involved)
    pub fn from_str_contents(contents: &str) -> Result<Self> {
        let ini = Ini::load_from_str(contents)
            .map_err(|e| HablaError::IniParse(format!("Failed to parse config: {}", e)))?;

        let config = Self {
            ini,
            path: PathBuf::new(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Default config file path
    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_NAME)
            .join("habla.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every typed value once so bad entries surface at startup
    fn validate(&self) -> Result<()> {
        self.backend()?;
        self.language()?;
        self.device()?;
        self.espeak_base_wpm()?;
        Ok(())
    }

    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key).map(str::trim)
    }

    /// Parse a value, naming the offending key on failure
    fn parse<T: FromStr>(&self, section: &str, key: &str, default: T) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(section, key) {
            Some(raw) => raw.parse().map_err(|e| {
                HablaError::Config(format!("Invalid value for {}.{}: {}", section, key, e))
            }),
            None => Ok(default),
        }
    }

    /// Which synthesis backend to use (`auto`, `melo`, `espeak`)
    pub fn backend(&self) -> Result<BackendKind> {
        self.parse("model", "backend", BackendKind::Auto)
    }

    /// Target language of the voice model
    pub fn language(&self) -> Result<Language> {
        self.parse("model", "language", Language::default())
    }

    /// Compute device preference
    pub fn device(&self) -> Result<Device> {
        self.parse("model", "device", Device::Auto)
    }

    /// Python interpreter that has MeloTTS installed
    pub fn python(&self) -> String {
        self.get("model", "python")
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_PYTHON)
            .to_string()
    }

    /// espeak-ng executable
    pub fn espeak_path(&self) -> String {
        self.get("espeak", "path")
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ESPEAK)
            .to_string()
    }

    /// Words per minute at speed 1.0
    pub fn espeak_base_wpm(&self) -> Result<u16> {
        self.parse("espeak", "base_wpm", DEFAULT_BASE_WPM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_str_contents("").unwrap();
        assert_eq!(config.backend().unwrap(), BackendKind::Auto);
        assert_eq!(config.language().unwrap(), Language::Es);
        assert_eq!(config.device().unwrap(), Device::Auto);
        assert_eq!(config.python(), "python3");
        assert_eq!(config.espeak_path(), "espeak-ng");
        assert_eq!(config.espeak_base_wpm().unwrap(), 175);
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = Config::from_str_contents("[model]\ndevice = tpu\n")
            .err()
            .expect("tpu is not a device");
        assert!(err.to_string().contains("model.device"));
    }
}
