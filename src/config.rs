use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use turing_cv::{ClockMode, NoteEncoder, Settings};

use crate::audio::WaveType;

const DEFAULT_CONFIG: &str = include_str!("../config.json");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    hardware: HardwareConfig,
    #[serde(default)]
    sequencer: SequencerConfig,
    #[serde(default)]
    audio: AudioConfig,
}

#[derive(Deserialize, Default)]
struct HardwareConfig {
    button_threshold:  Option<u8>,
    random_threshold:  Option<u8>,
    counts_per_octave: Option<u32>,
    max_code:          Option<u16>,
}

#[derive(Deserialize, Default)]
struct SequencerConfig {
    scale:          Option<usize>,
    external_clock: Option<bool>,
    seed:           Option<u64>,
}

#[derive(Deserialize, Default)]
struct AudioConfig {
    enabled: Option<bool>,
    volume:  Option<f32>,
    wave:    Option<String>,
}

/// Embedded defaults overlaid with the user's file, if any.
pub struct Config {
    hardware:  HardwareConfig,
    sequencer: SequencerConfig,
    audio:     AudioConfig,
}

impl Config {
    /// Load defaults, then overlay `path` if given (errors are fatal), else
    /// the per-user file if it exists (errors are logged and skipped).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut base: ConfigFile =
            serde_json::from_str(DEFAULT_CONFIG).context("parsing embedded config.json")?;

        match path {
            Some(p) => {
                let user = read_file(p)?;
                merge(&mut base, user);
            }
            None => {
                if let Some(p) = user_config_path().filter(|p| p.exists()) {
                    match read_file(&p) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => log::warn!(target: "config", "ignoring config {}: {:#}", p.display(), e),
                    }
                }
            }
        }

        Ok(Config { hardware: base.hardware, sequencer: base.sequencer, audio: base.audio })
    }

    pub fn settings(&self) -> Settings {
        let fallback = Settings::default();
        let h = &self.hardware;
        Settings {
            button_threshold: h.button_threshold.unwrap_or(fallback.button_threshold),
            random_threshold: h.random_threshold.unwrap_or(fallback.random_threshold),
            encoder: NoteEncoder::new(
                h.counts_per_octave.unwrap_or(fallback.encoder.counts_per_octave),
                h.max_code.unwrap_or(fallback.encoder.max_code),
            ),
            scale: self.sequencer.scale.unwrap_or(fallback.scale),
            clock_mode: if self.sequencer.external_clock.unwrap_or(false) {
                ClockMode::External
            } else {
                ClockMode::Internal
            },
        }
    }

    pub fn seed(&self) -> Option<u64> { self.sequencer.seed }

    pub fn audio_enabled(&self) -> bool { self.audio.enabled.unwrap_or(true) }

    /// Monitor volume (clamped to 0..1).
    pub fn audio_volume(&self) -> f32 {
        self.audio.volume.unwrap_or(0.4).clamp(0.0, 1.0)
    }

    pub fn audio_wave(&self) -> WaveType {
        match self.audio.wave.as_deref() {
            None => WaveType::Triangle,
            Some(name) => WaveType::from_name(name).unwrap_or_else(|| {
                log::warn!(target: "config", "unknown wave {:?}, using triangle", name);
                WaveType::Triangle
            }),
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("turing-cv").join("config.json"))
}

fn read_file(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    let (b, u) = (&mut base.hardware, user.hardware);
    if u.button_threshold.is_some()  { b.button_threshold = u.button_threshold; }
    if u.random_threshold.is_some()  { b.random_threshold = u.random_threshold; }
    if u.counts_per_octave.is_some() { b.counts_per_octave = u.counts_per_octave; }
    if u.max_code.is_some()          { b.max_code = u.max_code; }

    let (b, u) = (&mut base.sequencer, user.sequencer);
    if u.scale.is_some()          { b.scale = u.scale; }
    if u.external_clock.is_some() { b.external_clock = u.external_clock; }
    if u.seed.is_some()           { b.seed = u.seed; }

    let (b, u) = (&mut base.audio, user.audio);
    if u.enabled.is_some() { b.enabled = u.enabled; }
    if u.volume.is_some()  { b.volume = u.volume; }
    if u.wave.is_some()    { b.wave = u.wave; }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(json.as_bytes()).expect("write");
        f
    }

    #[test]
    fn embedded_defaults_match_core_defaults() {
        let base: ConfigFile = serde_json::from_str(DEFAULT_CONFIG).expect("embedded config");
        let cfg = Config { hardware: base.hardware, sequencer: base.sequencer, audio: base.audio };
        assert_eq!(cfg.settings(), Settings::default());
        assert_eq!(cfg.seed(), None);
        assert_eq!(cfg.audio_wave(), WaveType::Triangle);
    }

    #[test]
    fn user_file_overrides_only_given_fields() {
        let f = write_config(r#"{ "sequencer": { "scale": 1, "seed": 42 }, "hardware": { "button_threshold": 16 } }"#);
        let cfg = Config::load(Some(f.path())).expect("load");
        let s = cfg.settings();
        assert_eq!(s.scale, 1);
        assert_eq!(s.button_threshold, 16);
        assert_eq!(s.random_threshold, 150);
        assert_eq!(s.encoder, NoteEncoder::default());
        assert_eq!(cfg.seed(), Some(42));
    }

    #[test]
    fn external_clock_flag_selects_external() {
        let f = write_config(r#"{ "sequencer": { "external_clock": true } }"#);
        let cfg = Config::load(Some(f.path())).expect("load");
        assert_eq!(cfg.settings().clock_mode, ClockMode::External);
    }

    #[test]
    fn explicit_malformed_file_is_an_error() {
        let f = write_config("{ not json");
        assert!(Config::load(Some(f.path())).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("dir");
        assert!(Config::load(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn audio_values_are_sanitized() {
        let f = write_config(r#"{ "audio": { "volume": 3.0, "wave": "kazoo", "enabled": false } }"#);
        let cfg = Config::load(Some(f.path())).expect("load");
        assert_eq!(cfg.audio_volume(), 1.0);
        assert_eq!(cfg.audio_wave(), WaveType::Triangle);
        assert!(!cfg.audio_enabled());
    }
}
