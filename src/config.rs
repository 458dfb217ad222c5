use crate::defaults;
use crate::error::{RehearseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub session: SessionSection,
    pub voice: VoiceConfig,
    pub playback: PlaybackConfig,
}

/// Session pacing defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSection {
    pub pause_secs: u32,
    pub speed: f32,
    pub question_count: usize,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    /// Prefer the premium voice when it is available.
    pub use_premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub espeak_binary: String,
    pub espeak_voice: String,
}

/// Audio delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub target: PlaybackMode,
    /// Keep client-stream clips here. Unset means a per-session temporary
    /// directory that is removed when the session ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// How the playback target is chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Decide from the environment at session start.
    #[default]
    Auto,
    /// Always play on the local audio device.
    Device,
    /// Always deliver clips for client-side playback.
    Client,
}

impl FromStr for PlaybackMode {
    type Err = RehearseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "device" => Ok(Self::Device),
            "client" => Ok(Self::Client),
            other => Err(RehearseError::out_of_range(
                "playback.target",
                format!("expected auto, device or client, got '{}'", other),
            )),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            pause_secs: defaults::PAUSE_SECS,
            speed: defaults::SPEED,
            question_count: defaults::QUESTION_COUNT,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            use_premium: false,
            api_key: None,
            voice_id: defaults::ELEVENLABS_VOICE_ID.to_string(),
            model_id: defaults::ELEVENLABS_MODEL_ID.to_string(),
            stability: defaults::ELEVENLABS_STABILITY,
            espeak_binary: defaults::ESPEAK_BINARY.to_string(),
            espeak_voice: defaults::ESPEAK_VOICE.to_string(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            target: PlaybackMode::Auto,
            export_dir: None,
            device: None,
        }
    }
}

impl VoiceConfig {
    /// The configured premium credential, if any non-blank one is set.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RehearseError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                RehearseError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(RehearseError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - ELEVENLABS_API_KEY → voice.api_key
    /// - REHEARSE_PREMIUM_VOICE → voice.use_premium (1/true/yes)
    /// - REHEARSE_PLAYBACK → playback.target (ignored if unparseable)
    /// - REHEARSE_EXPORT_DIR → playback.export_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("ELEVENLABS_API_KEY")
            && !key.is_empty()
        {
            self.voice.api_key = Some(key);
        }

        if let Ok(flag) = std::env::var("REHEARSE_PREMIUM_VOICE")
            && !flag.is_empty()
        {
            self.voice.use_premium = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(target) = std::env::var("REHEARSE_PLAYBACK")
            && !target.is_empty()
        {
            match target.parse() {
                Ok(mode) => self.playback.target = mode,
                Err(e) => tracing::warn!("ignoring REHEARSE_PLAYBACK: {}", e),
            }
        }

        if let Ok(dir) = std::env::var("REHEARSE_EXPORT_DIR")
            && !dir.is_empty()
        {
            self.playback.export_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/rehearse/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rehearse")
            .join("config.toml")
    }

    /// Render the effective configuration as TOML, with the API key masked.
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.voice.api_key.is_some() {
            shown.voice.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| RehearseError::ConfigParse {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_rehearse_env() {
        remove_env("ELEVENLABS_API_KEY");
        remove_env("REHEARSE_PREMIUM_VOICE");
        remove_env("REHEARSE_PLAYBACK");
        remove_env("REHEARSE_EXPORT_DIR");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.session.pause_secs, 10);
        assert_eq!(config.session.speed, 1.0);
        assert_eq!(config.session.question_count, 5);

        assert!(!config.voice.use_premium);
        assert_eq!(config.voice.api_key, None);
        assert_eq!(config.voice.model_id, "eleven_multilingual_v2");
        assert_eq!(config.voice.espeak_binary, "espeak-ng");

        assert_eq!(config.playback.target, PlaybackMode::Auto);
        assert_eq!(config.playback.export_dir, None);
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [session]
            pause_secs = 15
            speed = 1.2
            question_count = 8

            [voice]
            use_premium = true
            api_key = "secret"
            espeak_voice = "en-us"

            [playback]
            target = "client"
            export_dir = "/tmp/clips"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.session.pause_secs, 15);
        assert_eq!(config.session.speed, 1.2);
        assert_eq!(config.session.question_count, 8);
        assert!(config.voice.use_premium);
        assert_eq!(config.voice.api_key(), Some("secret"));
        assert_eq!(config.voice.espeak_voice, "en-us");
        assert_eq!(config.playback.target, PlaybackMode::Client);
        assert_eq!(config.playback.export_dir, Some(PathBuf::from("/tmp/clips")));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[session]\npause_secs = 7\n").unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.session.pause_secs, 7);
        assert_eq!(config.session.speed, 1.0);
        assert_eq!(config.voice, VoiceConfig::default());
        assert_eq!(config.playback, PlaybackConfig::default());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[session\npause_secs = ").unwrap();

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_rehearse_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let missing_path = Path::new("/tmp/nonexistent_rehearse_config_12345.toml");
        assert!(matches!(
            Config::load(missing_path),
            Err(RehearseError::ConfigFileNotFound { .. })
        ));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let mut config = VoiceConfig::default();
        config.api_key = Some("   ".to_string());
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_playback_mode_parsing() {
        assert_eq!("auto".parse::<PlaybackMode>().unwrap(), PlaybackMode::Auto);
        assert_eq!("Device".parse::<PlaybackMode>().unwrap(), PlaybackMode::Device);
        assert_eq!(" client ".parse::<PlaybackMode>().unwrap(), PlaybackMode::Client);
        assert!("speaker".parse::<PlaybackMode>().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_rehearse_env();

        set_env("ELEVENLABS_API_KEY", "from-env");
        set_env("REHEARSE_PREMIUM_VOICE", "true");
        set_env("REHEARSE_PLAYBACK", "client");
        set_env("REHEARSE_EXPORT_DIR", "/srv/clips");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.voice.api_key(), Some("from-env"));
        assert!(config.voice.use_premium);
        assert_eq!(config.playback.target, PlaybackMode::Client);
        assert_eq!(config.playback.export_dir, Some(PathBuf::from("/srv/clips")));

        clear_rehearse_env();
    }

    #[test]
    fn test_env_override_invalid_playback_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_rehearse_env();

        set_env("REHEARSE_PLAYBACK", "speaker");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.playback.target, PlaybackMode::Auto);

        clear_rehearse_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_rehearse_env();

        set_env("ELEVENLABS_API_KEY", "");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.voice.api_key, None);

        clear_rehearse_env();
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("rehearse"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_display_toml_masks_api_key() {
        let mut config = Config::default();
        config.voice.api_key = Some("super-secret".to_string());

        let shown = config.to_display_toml().unwrap();

        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("********"));
        assert!(shown.contains("[session]"));
    }

    #[test]
    fn test_display_toml_round_trips_without_key() {
        let config = Config::default();
        let shown = config.to_display_toml().unwrap();
        let parsed: Config = toml::from_str(&shown).unwrap();
        assert_eq!(parsed, config);
    }
}
