//! Bot configuration, loaded once at startup from `conf.json`.

use crate::error::{Error, Result};
use crate::types::AllowedActor;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name looked up in [`SEARCH_PATHS`].
pub const CONFIG_FILE: &str = "conf.json";

/// Directories searched for [`CONFIG_FILE`], in order.
pub const SEARCH_PATHS: [&str; 2] = [".", "/srv/satispayCSV2budgetbanker/"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Bot API token.
    #[serde(rename = "BotAPIKey", alias = "botapikey", alias = "bot_api_key")]
    pub bot_api_key: String,

    /// Users allowed to talk to the bot. Absent means nobody.
    #[serde(rename = "RestrictTo", alias = "restrictto", alias = "restrict_to", default)]
    pub restrict_to: Option<Vec<AllowedActor>>,

    /// Legacy setting, accepted and ignored.
    #[serde(rename = "MountDisks", alias = "mountdisks", alias = "mount_disks", default)]
    pub mount_disks: Vec<String>,

    /// Where converted files are written before upload.
    #[serde(rename = "OutputDir", alias = "outputdir", alias = "output_dir", default)]
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Parse a configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        if config.bot_api_key.trim().is_empty() {
            return Err(Error::Config("BotAPIKey is empty".into()));
        }
        Ok(config)
    }

    /// Load from an explicit file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&json)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `conf.json` from the first of `dirs` that has one.
    pub fn discover<P: AsRef<Path>>(dirs: &[P]) -> Result<Self> {
        for dir in dirs {
            let candidate = dir.as_ref().join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        let searched: Vec<String> = dirs
            .iter()
            .map(|d| d.as_ref().display().to_string())
            .collect();
        Err(Error::Config(format!(
            "{} not found in {}",
            CONFIG_FILE,
            searched.join(", ")
        )))
    }

    /// Use `path` when given, otherwise search the default locations.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::discover(&SEARCH_PATHS),
        }
    }

    /// Directory for converted files.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "BotAPIKey": "123:abc",
        "RestrictTo": [{"Username": "mario", "ChatID": 42}],
        "MountDisks": ["/mnt/data"]
    }"#;

    #[test]
    fn test_parse_config() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.bot_api_key, "123:abc");
        assert_eq!(
            config.restrict_to,
            Some(vec![AllowedActor {
                username: "mario".into(),
                chat_id: 42
            }])
        );
        assert_eq!(config.mount_disks, vec!["/mnt/data".to_string()]);
        assert_eq!(config.output_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_lowercase_keys() {
        let config =
            Config::from_json(r#"{"botapikey": "t", "restrictto": [], "outputdir": "/var/out"}"#)
                .unwrap();
        assert_eq!(config.bot_api_key, "t");
        assert_eq!(config.restrict_to, Some(vec![]));
        assert_eq!(config.output_dir(), PathBuf::from("/var/out"));
    }

    #[test]
    fn test_missing_key() {
        let err = Config::from_json(r#"{"RestrictTo": []}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_json(r#"{"BotAPIKey": " "}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_discover_first_match() {
        let empty = tempfile::tempdir().unwrap();
        let with_conf = tempfile::tempdir().unwrap();
        fs::write(with_conf.path().join(CONFIG_FILE), SAMPLE).unwrap();

        let config = Config::discover(&[empty.path(), with_conf.path()]).unwrap();
        assert_eq!(config.bot_api_key, "123:abc");
    }

    #[test]
    fn test_discover_nothing_found() {
        let empty = tempfile::tempdir().unwrap();
        let err = Config::discover(&[empty.path()]).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.json");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.mount_disks.len(), 1);

        let err = Config::load(Some(dir.path().join("nope.json").as_path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
