//! Coach configuration.
//!
//! Loaded from `~/.coach/config.toml`. Every field is optional and a missing
//! file means defaults. A few settings can be overridden from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::builder::{DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES};
use crate::manager::ManagerSettings;
use crate::plan::{self, PlanDay};
use crate::policy::{RuleAction, SportPolicy};
use crate::storage::FileIndex;

pub const INDEX_PATH_ENV: &str = "COACH_INDEX_PATH";
pub const SESSION_PATH_ENV: &str = "COACH_SESSION_PATH";
pub const BRIDGE_ENV: &str = "COACH_BRIDGE";

/// Coach configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Where the scheduled-workout index lives.
    /// Defaults to `~/.coach/scheduled_workouts.json`.
    pub index_path: Option<PathBuf>,

    /// Session file handed to the bridge command.
    pub session_path: Option<PathBuf>,

    #[serde(default)]
    pub remote: RemoteConfig,

    /// Length of fallback workouts when a request gives none.
    pub default_duration_minutes: Option<u32>,

    /// Either a preset name (`"fallback"`, `"strict"`) or a full rule table.
    pub sport_policy: Option<PolicySetting>,

    /// Replaces the built-in week plan.
    pub week_plan: Option<Vec<PlanDay>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RemoteConfig {
    /// The bridge program followed by its fixed arguments.
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PolicySetting {
    Preset(PolicyPreset),
    Table(SportPolicy),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyPreset {
    /// HIIT falls back to cardio training with a warning.
    Fallback,
    /// HIIT is rejected.
    Strict,
}

impl PolicySetting {
    pub fn policy(&self) -> SportPolicy {
        match self {
            Self::Preset(PolicyPreset::Fallback) => SportPolicy::default(),
            Self::Preset(PolicyPreset::Strict) => SportPolicy::strict(),
            Self::Table(policy) => policy.clone(),
        }
    }
}

impl Config {
    /// Load config from `path` (or `~/.coach/config.toml`), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path().ok_or("could not determine home directory")?,
        };

        let mut config = Self::load_from(&path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load config from `path`. A missing file is the default config.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// Parse and validate config text.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;

        if let Some(minutes) = config.default_duration_minutes {
            if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
                return Err(format!(
                    "default-duration-minutes must be between {MIN_DURATION_MINUTES} and \
                     {MAX_DURATION_MINUTES}, got {minutes}"
                ));
            }
        }

        if let Some(PolicySetting::Table(policy)) = &config.sport_policy {
            for rule in &policy.rules {
                if let RuleAction::Fallback { applied, warning } = &rule.action {
                    if *applied != rule.requested && warning.trim().is_empty() {
                        return Err(format!(
                            "sport-policy rule for {} needs a non-empty warning",
                            rule.requested
                        ));
                    }
                }
            }
        }

        if let Some(days) = &config.week_plan {
            for (i, day) in days.iter().enumerate() {
                let clash = days[..i]
                    .iter()
                    .any(|other| other.weekday == day.weekday && other.slot == day.slot);
                if clash {
                    return Err(format!(
                        "week-plan lists {} slot {} twice",
                        plan::weekday_label(day.weekday),
                        day.slot
                    ));
                }
            }
        }

        Ok(config)
    }

    /// Apply `COACH_INDEX_PATH`, `COACH_SESSION_PATH` and `COACH_BRIDGE`.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        if let Some(path) = var(INDEX_PATH_ENV) {
            self.index_path = Some(PathBuf::from(path));
        }
        if let Some(path) = var(SESSION_PATH_ENV) {
            self.session_path = Some(PathBuf::from(path));
        }
        if let Some(command) = var(BRIDGE_ENV) {
            self.remote.command = command.split_whitespace().map(str::to_string).collect();
        }
    }

    /// The config file path: `~/.coach/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".coach").join("config.toml"))
    }

    /// The configured index path, or the default one.
    pub fn index_path(&self) -> Option<PathBuf> {
        self.index_path.clone().or_else(FileIndex::default_path)
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            policy: self
                .sport_policy
                .as_ref()
                .map(PolicySetting::policy)
                .unwrap_or_default(),
            week_plan: self
                .week_plan
                .clone()
                .unwrap_or_else(plan::default_week_plan),
            default_duration_minutes: self
                .default_duration_minutes
                .unwrap_or(DEFAULT_DURATION_MINUTES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use jiff::civil::Weekday;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::model::Sport;

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());

        let settings = config.manager_settings();
        assert_eq!(settings.policy, SportPolicy::default());
        assert_eq!(settings.week_plan, plan::default_week_plan());
        assert_eq!(settings.default_duration_minutes, DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            r#"
            index-path = "/data/index.json"
            session-path = "/data/session.json"
            default-duration-minutes = 30

            [remote]
            command = ["python3", "bridge.py"]

            [sport-policy]
            version = 3
            rules = [
                { requested = "hiit", action = "fallback", applied = "running", warning = "run it" },
            ]

            [[week-plan]]
            weekday = "tuesday"
            template = "easy-run"
            "#,
        )
        .unwrap();

        assert_eq!(config.index_path(), Some(PathBuf::from("/data/index.json")));
        assert_eq!(config.remote.command, vec!["python3", "bridge.py"]);

        let settings = config.manager_settings();
        assert_eq!(settings.default_duration_minutes, 30);
        assert_eq!(settings.policy.version, 3);
        assert_eq!(
            settings.policy.rules[0].action,
            RuleAction::Fallback {
                applied: Sport::Running,
                warning: "run it".into(),
            }
        );
        assert_eq!(settings.week_plan, vec![PlanDay::new(Weekday::Tuesday, "easy-run")]);
    }

    #[test]
    fn fallback_rule_without_warning_is_rejected() {
        let err = Config::parse(
            r#"
            [sport-policy]
            version = 2
            rules = [
                { requested = "hiit", action = "fallback", applied = "running", warning = "" },
            ]
            "#,
        )
        .unwrap_err();

        assert_eq!(err, "sport-policy rule for hiit needs a non-empty warning");
    }

    #[test]
    fn policy_presets() {
        let strict = Config::parse(r#"sport-policy = "strict""#).unwrap();
        assert_eq!(strict.manager_settings().policy, SportPolicy::strict());

        let fallback = Config::parse(r#"sport-policy = "fallback""#).unwrap();
        assert_eq!(fallback.manager_settings().policy, SportPolicy::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse("default-duration-minutes = 5").is_err());
        assert!(Config::parse("colour = \"red\"").is_err());
        assert!(Config::parse(r#"sport-policy = "lenient""#).is_err());

        let twice = Config::parse(
            r#"
            [[week-plan]]
            weekday = "mon"
            template = "strength-a"

            [[week-plan]]
            weekday = "monday"
            template = "strength-b"
            "#,
        )
        .unwrap_err();
        assert!(twice.contains("monday slot 0 twice"), "{twice}");
    }

    #[test]
    fn invalid_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "index-path = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains(&path.display().to_string()));
    }

    #[test]
    fn environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (INDEX_PATH_ENV, "/tmp/index.json"),
            (SESSION_PATH_ENV, "  "),
            (BRIDGE_ENV, "node  bridge.js --quiet"),
        ]);
        let mut config = Config {
            session_path: Some(PathBuf::from("/keep/session.json")),
            ..Config::default()
        };

        config.apply_env(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.index_path, Some(PathBuf::from("/tmp/index.json")));
        assert_eq!(config.session_path, Some(PathBuf::from("/keep/session.json")));
        assert_eq!(config.remote.command, vec!["node", "bridge.js", "--quiet"]);
    }
}
