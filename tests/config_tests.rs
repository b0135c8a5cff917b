//! Configuration loading from disk

use speech_studio::backend::QueryMode;
use speech_studio::integration::StudioConfig;
use speech_studio::speech::Language;
use speech_studio::StudioError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_full_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [backend]
        url = "https://chat.example.org/query"
        timeout_secs = 10
        mode = "multi"

        [audio]
        enabled = false

        [speech]
        language = "bho-IN"

        [particles]
        count = 1200
        opacity = 0.5

        [recognition]
        silence_ms = 600

        [ui]
        show_debug_panel = true
        "#,
    )
    .unwrap();

    let config = StudioConfig::load(&path).unwrap();

    assert_eq!(config.backend.url, "https://chat.example.org/query");
    assert_eq!(config.backend.timeout_secs, 10);
    assert_eq!(config.backend.mode, QueryMode::Multi);
    assert!(!config.audio.enabled);
    assert_eq!(config.speech.language, Language::BhoIn);
    assert_eq!(config.particles.count, 1200);
    assert_eq!(config.particles.opacity, 0.5);
    assert_eq!(config.recognition.silence_ms, 600);
    assert!(config.ui.show_debug_panel);
    assert!(config.validate().is_ok());
}

#[test]
fn test_discover_prefers_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("studio.toml");
    fs::write(&path, "[particles]\ncount = 42\n").unwrap();

    let config = StudioConfig::discover(Some(&path)).unwrap();
    assert_eq!(config.particles.count, 42);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = StudioConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, StudioError::ConfigError(_)));
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[backend\nurl = ").unwrap();

    let err = StudioConfig::load(&path).unwrap_err();
    assert!(matches!(err, StudioError::ConfigError(_)));
}

#[test]
fn test_voice_paths_are_checked() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("hi.onnx");
    let tokens = dir.path().join("tokens.txt");
    fs::write(&model, b"model").unwrap();

    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!(
            "[[speech.voices]]\nname = \"priyamvada\"\nlanguage = \"hi-IN\"\nmodel = {:?}\ntokens = {:?}\n",
            model.display().to_string(),
            tokens.display().to_string()
        ),
    )
    .unwrap();

    let config = StudioConfig::load(&path).unwrap();
    assert_eq!(config.speech.voices.len(), 1);
    assert!(config.validate().is_err(), "tokens file is missing");

    fs::write(&tokens, "a 0\n").unwrap();
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_amplitude_scale_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[particles]\namplitude_scale = 0.0\n").unwrap();

    let config = StudioConfig::load(&path).unwrap();
    assert!(matches!(config.validate(), Err(StudioError::ConfigError(_))));
}
