//! Configuration loading tests
//!
//! Tests that the optional config file is read correctly and that
//! missing entries fall back to defaults

use habla::config::Config;
use habla::synth::{create_loader, BackendKind, Device, Language};
use std::fs;

#[test]
fn test_config_loads_successfully() {
    // Whatever the user has (or doesn't have) on disk must parse
    let config = Config::load().expect("Failed to load config");
    assert!(config.path().to_string_lossy().contains("habla.cfg"));
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habla.cfg");
    fs::write(
        &path,
        "[model]\nbackend = espeak\nlanguage = fr\ndevice = cpu\npython = /opt/melo/bin/python\n\n\
         [espeak]\npath = /usr/local/bin/espeak-ng\nbase_wpm = 160\n",
    )
    .unwrap();

    let config = Config::load_from(&path).expect("config should parse");
    assert_eq!(config.path(), path.as_path());
    assert_eq!(config.backend().unwrap(), BackendKind::Espeak);
    assert_eq!(config.language().unwrap(), Language::Fr);
    assert_eq!(config.device().unwrap(), Device::Cpu);
    assert_eq!(config.python(), "/opt/melo/bin/python");
    assert_eq!(config.espeak_path(), "/usr/local/bin/espeak-ng");
    assert_eq!(config.espeak_base_wpm().unwrap(), 160);
}

#[test]
fn test_partial_config_uses_defaults() {
    let config = Config::from_str_contents("[model]\ndevice = cuda\n").unwrap();
    assert_eq!(config.device().unwrap(), Device::Cuda);
    assert_eq!(config.language().unwrap(), Language::Es);
    assert_eq!(config.backend().unwrap(), BackendKind::Auto);
    assert_eq!(config.python(), "python3");
}

#[test]
fn test_bad_values_rejected() {
    assert!(Config::from_str_contents("[model]\nlanguage = klingon\n").is_err());
    assert!(Config::from_str_contents("[model]\nbackend = festival\n").is_err());
    assert!(Config::from_str_contents("[espeak]\nbase_wpm = fast\n").is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load_from(&dir.path().join("absent.cfg")).is_err());
}

#[test]
fn test_create_loader_from_config() {
    let config = Config::from_str_contents("[model]\nbackend = melo\n").unwrap();
    assert!(create_loader(&config).is_ok());
}
