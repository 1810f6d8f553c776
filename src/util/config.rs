use std::io;
use std::path::Path;

use log::LevelFilter;

pub const DEFAULT_TICK_HZ: f32 = 60.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Player settings read from a `key = value` text file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerConfig {
    /// When false, fills never resolve textures and draw with their color only.
    pub textured_fills: bool,
    pub fixed_tick_hz: f32,
    pub log_level: LevelFilter,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { textured_fills: true, fixed_tick_hz: DEFAULT_TICK_HZ, log_level: crate::util::logging::default_level() }
    }
}

impl PlayerConfig {
    /// Read `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("config {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io { path: path.display().to_string(), source }),
        }
    }

    /// Parse config text. Unknown keys are ignored; bad values keep the default.
    pub fn parse(text: &str) -> Self {
        let mut cfg = Self::default();

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();

            if key.eq_ignore_ascii_case("textured_fills") {
                cfg.textured_fills = parse_bool(value);
            } else if key.eq_ignore_ascii_case("fixed_tick_hz") {
                match value.parse::<f32>() {
                    Ok(hz) if hz.is_finite() && hz > 0.0 => cfg.fixed_tick_hz = hz,
                    _ => log::warn!("config: fixed_tick_hz={:?} invalid, keeping {}", value, cfg.fixed_tick_hz),
                }
            } else if key.eq_ignore_ascii_case("log_level") {
                match value.parse::<LevelFilter>() {
                    Ok(level) => cfg.log_level = level,
                    Err(_) => log::warn!("config: log_level={:?} invalid, keeping {}", value, cfg.log_level),
                }
            } else {
                log::debug!("config: unknown key {:?}", key);
            }
        }

        cfg
    }

    /// Seconds per fixed tick.
    pub fn fixed_step(&self) -> f32 {
        1.0 / self.fixed_tick_hz
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "on" | "ON" | "yes" | "YES")
}
