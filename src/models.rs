use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::COMBINE_RESULTS;
use crate::errors::{Error, Result};

/// Everything needed to launch one build container. Built once by the
/// caller and consumed read-only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfiguration {
    pub image: String,
    pub editor_version: String,
    pub workspace: PathBuf,
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub custom_parameters: String,
    #[serde(default)]
    pub test_mode: TestMode,
    #[serde(default)]
    pub coverage_options: String,
    #[serde(default = "default_artifacts_path")]
    pub artifacts_path: String,
    #[serde(default)]
    pub use_host_network: bool,
    #[serde(default, deserialize_with = "non_empty")]
    pub ssh_agent: Option<String>,
    #[serde(default, deserialize_with = "secret")]
    pub git_private_token: Option<Secret>,
    #[serde(default, deserialize_with = "secret")]
    pub github_token: Option<Secret>,
    pub runner_temporary_path: PathBuf,
}

fn default_artifacts_path() -> String {
    "artifacts".to_string()
}

impl BuildConfiguration {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        serde_json::from_str(txt).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Which test suites the container runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    Playmode,
    Editmode,
    #[default]
    All,
    None,
}

impl TestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestMode::Playmode => "playmode",
            TestMode::Editmode => "editmode",
            TestMode::All => "all",
            TestMode::None => "none",
        }
    }

    /// `;`-joined platform list passed to the container as TEST_PLATFORMS.
    pub fn test_platforms(&self) -> String {
        match self {
            TestMode::All => ["playmode", "editmode", COMBINE_RESULTS].join(";"),
            other => other.as_str().to_string(),
        }
    }
}

impl FromStr for TestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "playmode" => Ok(TestMode::Playmode),
            "editmode" => Ok(TestMode::Editmode),
            "all" => Ok(TestMode::All),
            "none" => Ok(TestMode::None),
            other => Err(Error::Config(format!("unknown test mode '{other}'"))),
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential that must never show up in logs. Only constructible from a
/// non-empty string, so "absent" is always `None`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub const REDACTED: &'static str = "***";

    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() { None } else { Some(Self(value)) }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", Self::REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(Self::REDACTED)
    }
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Secret>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.and_then(Secret::new))
}

fn non_empty<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.is_empty()))
}
