/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, or else from the executable's
/// directory (then CWD). Missing files and missing keys fall back to defaults;
/// a file that exists but does not parse is ignored. Problems are collected
/// in `LoadedConfig` and logged by `report` once the subscriber is up.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::card::{Gender, HofTime, TrainerCard, NUM_BADGES};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub profile: TrainerCard,
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub flip: Vec<String>,
    pub close: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: String,
    pub file: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("ignoring badge index {index} (expected 0-7)")]
    BadgeIndex { index: usize },
}

/// Result of `AppConfig::load`: the settings in effect, the file they came
/// from, and everything that was skipped on the way.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
    pub problems: Vec<ConfigError>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    profile: TomlProfile,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_flip")]
    flip: Vec<String>,
    #[serde(default = "default_close")]
    close: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum TomlGender {
    Male,
    Female,
}

#[derive(Deserialize, Debug, Default)]
struct TomlHof {
    #[serde(default)]
    hours: u16,
    #[serde(default)]
    minutes: u8,
    #[serde(default)]
    seconds: u8,
}

#[derive(Deserialize, Debug)]
struct TomlProfile {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_gender")]
    gender: TomlGender,
    #[serde(default)]
    trainer_id: u16,
    #[serde(default)]
    money: u32,
    #[serde(default = "default_true")]
    has_pokedex: bool,
    #[serde(default)]
    caught_count: u16,
    #[serde(default)]
    play_hours: u16,
    #[serde(default)]
    play_minutes: u8,
    #[serde(default)]
    hof_debut: TomlHof,
    #[serde(default)]
    link_wins: u32,
    #[serde(default)]
    link_losses: u32,
    #[serde(default)]
    trades: u32,
    /// Indices (0-7) of earned badges.
    #[serde(default)]
    badges: Vec<usize>,
    #[serde(default)]
    tower_straight_wins: u16,
    #[serde(default)]
    caught_all: bool,
    #[serde(default)]
    all_paintings: bool,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_level")]
    level: String,
    #[serde(default = "default_log_file")]
    file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }   // ~60 ticks/s, one per hardware frame
fn default_flip() -> Vec<String> { vec!["A".into()] }
fn default_close() -> Vec<String> { vec!["B".into()] }
fn default_name() -> String { "PLAYER".into() }
fn default_gender() -> TomlGender { TomlGender::Male }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".into() }
fn default_log_file() -> String { "trainercard.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            flip: default_flip(),
            close: default_close(),
        }
    }
}

impl Default for TomlProfile {
    fn default() -> Self {
        TomlProfile {
            name: default_name(),
            gender: default_gender(),
            trainer_id: 0,
            money: 0,
            has_pokedex: default_true(),
            caught_count: 0,
            play_hours: 0,
            play_minutes: 0,
            hof_debut: TomlHof::default(),
            link_wins: 0,
            link_losses: 0,
            trades: 0,
            badges: Vec::new(),
            tower_straight_wins: 0,
            caught_all: false,
            all_paintings: false,
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

impl TomlProfile {
    fn into_card(self, problems: &mut Vec<ConfigError>) -> TrainerCard {
        let mut badges = [false; NUM_BADGES];
        for index in self.badges {
            match badges.get_mut(index) {
                Some(slot) => *slot = true,
                None => problems.push(ConfigError::BadgeIndex { index }),
            }
        }
        TrainerCard {
            name: self.name,
            gender: match self.gender {
                TomlGender::Male => Gender::Male,
                TomlGender::Female => Gender::Female,
            },
            trainer_id: self.trainer_id,
            money: self.money,
            has_pokedex: self.has_pokedex,
            caught_count: self.caught_count,
            play_hours: self.play_hours,
            play_minutes: self.play_minutes,
            hof_debut: HofTime {
                hours: self.hof_debut.hours,
                minutes: self.hof_debut.minutes,
                seconds: self.hof_debut.seconds,
            },
            link_wins: self.link_wins,
            link_losses: self.link_losses,
            trades: self.trades,
            badges,
            tower_straight_wins: self.tower_straight_wins,
            caught_all: self.caught_all,
            all_paintings: self.all_paintings,
        }
        .normalized()
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config. With `explicit` set, only that file is tried; otherwise
    /// `config.toml` is searched in (1) exe directory, (2) current working
    /// directory. Any failure falls back to defaults and is recorded in
    /// `problems`; nothing is logged here.
    pub fn load(explicit: Option<&Path>) -> LoadedConfig {
        let mut problems = Vec::new();
        let found = match explicit {
            Some(path) => match read_toml(path) {
                Ok(cfg) => Some((path.to_path_buf(), cfg)),
                Err(e) => {
                    problems.push(e);
                    None
                }
            },
            None => find_toml(&candidate_dirs(), &mut problems),
        };
        let (source, cfg) = match found {
            Some((path, cfg)) => (Some(path), cfg),
            None => (None, TomlConfig::default()),
        };
        let config = Self::from_toml(cfg, &mut problems);
        LoadedConfig { config, source, problems }
    }

    /// Parse config text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<LoadedConfig, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        let mut problems = Vec::new();
        let config = Self::from_toml(cfg, &mut problems);
        Ok(LoadedConfig { config, source: None, problems })
    }

    fn from_toml(cfg: TomlConfig, problems: &mut Vec<ConfigError>) -> Self {
        AppConfig {
            timing: TimingConfig {
                tick_rate_ms: cfg.timing.tick_rate_ms.max(1),
            },
            gamepad: GamepadConfig {
                flip: cfg.gamepad.flip,
                close: cfg.gamepad.close,
            },
            profile: cfg.profile.into_card(problems),
            log: LogConfig {
                level: cfg.log.level,
                file: PathBuf::from(cfg.log.file),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), &mut Vec::new())
    }
}

impl LoadedConfig {
    /// Log where the settings came from and every problem met while loading.
    /// Call after the tracing subscriber is installed.
    pub fn report(&self) {
        match &self.source {
            Some(path) => info!(path = %path.display(), "loaded config"),
            None => info!("no usable config.toml, using defaults"),
        }
        for problem in &self.problems {
            warn!("{problem}");
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn read_toml(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<TomlConfig>(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// First `config.toml` found in `search_dirs`. An unreadable file is skipped;
/// one that fails to parse stops the search.
fn find_toml(search_dirs: &[PathBuf], problems: &mut Vec<ConfigError>) -> Option<(PathBuf, TomlConfig)> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match read_toml(&path) {
            Ok(cfg) => return Some((path, cfg)),
            Err(e @ ConfigError::Parse { .. }) => {
                problems.push(e);
                return None;
            }
            Err(e) => problems.push(e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let loaded = AppConfig::from_toml_str("").unwrap();
        assert!(loaded.problems.is_empty());
        let cfg = loaded.config;
        assert_eq!(cfg.timing.tick_rate_ms, 16);
        assert_eq!(cfg.gamepad.flip, vec!["A".to_string()]);
        assert_eq!(cfg.gamepad.close, vec!["B".to_string()]);
        assert_eq!(cfg.profile.name, "PLAYER");
        assert!(cfg.profile.has_pokedex);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.file, PathBuf::from("trainercard.log"));
    }

    #[test]
    fn profile_is_read_and_capped() {
        let loaded = AppConfig::from_toml_str(
            r#"
            [timing]
            tick_rate_ms = 0

            [profile]
            name = "LEAF"
            gender = "female"
            trainer_id = 31337
            link_wins = 12000
            trades = 70000
            badges = [0, 3, 12]
            hof_debut = { hours = 1200, minutes = 3 }
            "#,
        )
        .unwrap();
        assert!(matches!(loaded.problems[..], [ConfigError::BadgeIndex { index: 12 }]));
        let cfg = loaded.config;
        assert_eq!(cfg.timing.tick_rate_ms, 1);
        let p = &cfg.profile;
        assert_eq!(p.name, "LEAF");
        assert_eq!(p.gender, Gender::Female);
        assert_eq!(p.trainer_id, 31337);
        assert_eq!(p.link_wins, 9999);
        assert_eq!(p.trades, 0xFFFF);
        assert_eq!(p.badge_count(), 2);
        assert!(p.badges[0] && p.badges[3]);
        assert_eq!(p.hof_debut, HofTime { hours: 999, minutes: 59, seconds: 59 });
    }

    #[test]
    fn bad_types_are_errors() {
        assert!(AppConfig::from_toml_str("[timing]\ntick_rate_ms = \"fast\"").is_err());
        assert!(AppConfig::from_toml_str("[profile]\ngender = \"robot\"").is_err());
    }

    #[test]
    fn missing_explicit_file_falls_back() {
        let loaded = AppConfig::load(Some(Path::new("/nonexistent/trainercard/config.toml")));
        assert_eq!(loaded.config.timing.tick_rate_ms, 16);
        assert!(loaded.source.is_none());
        assert!(matches!(loaded.problems[..], [ConfigError::Read { .. }]));
    }

    #[test]
    fn unparsable_file_surfaces_parse_error() {
        let path = std::env::temp_dir()
            .join(format!("trainercard-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[timing]\ntick_rate_ms = \"fast\"\n").unwrap();
        let loaded = AppConfig::load(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.config.timing.tick_rate_ms, 16);
        assert!(loaded.source.is_none());
        assert_eq!(loaded.problems.len(), 1);
        assert!(matches!(loaded.problems[0], ConfigError::Parse { .. }));
        assert!(loaded.problems[0].to_string().contains(&*path.to_string_lossy()));
    }

    #[test]
    fn good_file_records_its_source() {
        let path = std::env::temp_dir()
            .join(format!("trainercard-good-{}.toml", std::process::id()));
        std::fs::write(&path, "[timing]\ntick_rate_ms = 20\n").unwrap();
        let loaded = AppConfig::load(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.config.timing.tick_rate_ms, 20);
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert!(loaded.problems.is_empty());
    }

    #[test]
    fn read_error_names_the_path() {
        let err = read_toml(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/config.toml"));
    }
}
