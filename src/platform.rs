use serde::Serialize;
use std::fmt;

use crate::errors::{Error, Result};

/// Host platforms that have a container strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    /// Maps an OS identifier (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Platform::Linux),
            "windows" => Ok(Platform::Windows),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fails unless the host can run one of the platform strategies.
pub fn check_compatibility() -> Result<()> {
    Platform::current().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_hosts() {
        assert_eq!(Platform::from_os("linux").unwrap(), Platform::Linux);
        assert_eq!(Platform::from_os("windows").unwrap(), Platform::Windows);
    }

    #[test]
    fn test_unsupported_hosts() {
        for os in ["macos", "freebsd", "ios", "android", ""] {
            let err = Platform::from_os(os).unwrap_err();
            assert!(matches!(err, Error::UnsupportedPlatform(ref o) if o == os));
        }
    }

    #[test]
    fn test_check_compatibility_matches_host() {
        match std::env::consts::OS {
            "linux" | "windows" => assert!(check_compatibility().is_ok()),
            _ => assert!(check_compatibility().is_err()),
        }
        // no state between calls
        assert_eq!(check_compatibility().is_ok(), check_compatibility().is_ok());
    }
}
