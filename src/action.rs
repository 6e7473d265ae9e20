use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::{ACTION_DIR, CANONICAL_NAME, ROOT_ENV};
use crate::errors::{Error, Result};

static ACTION: OnceLock<ActionMetadata> = OnceLock::new();

/// Where the tool is installed and where its packaged assets live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMetadata {
    root_folder: PathBuf,
    action_folder: PathBuf,
}

impl ActionMetadata {
    /// Process-wide metadata, resolved on first use and fixed afterwards.
    pub fn global() -> Result<&'static ActionMetadata> {
        if let Some(action) = ACTION.get() {
            return Ok(action);
        }
        let located = Self::discover()?;
        Ok(ACTION.get_or_init(|| located))
    }

    /// `UNITY_TEST_RUNNER_ROOT` if set, else the closest ancestor of the
    /// running executable named after the tool.
    pub fn discover() -> Result<Self> {
        if let Some(root) = std::env::var_os(ROOT_ENV) {
            return Self::from_root(root);
        }
        let exe = std::env::current_exe()
            .map_err(|e| Error::ActionLayout(format!("cannot locate executable: {e}")))?;
        Self::discover_from(&exe)
    }

    /// Closest directory above `exe` named after the tool. The executable
    /// itself carries the same name, so the search starts at its parent.
    pub fn discover_from(exe: &Path) -> Result<Self> {
        let root = exe
            .parent()
            .into_iter()
            .flat_map(Path::ancestors)
            .find(|p| p.file_name().is_some_and(|n| n == CANONICAL_NAME) && p.is_dir())
            .ok_or_else(|| {
                Error::ActionLayout(format!(
                    "no '{CANONICAL_NAME}' directory above {} (set {ROOT_ENV})",
                    exe.display()
                ))
            })?;
        Self::from_root(root)
    }

    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root_folder = std::path::absolute(root)
            .map_err(|e| Error::ActionLayout(format!("{}: {e}", root.display())))?;

        if root_folder.file_name().map_or(true, |n| n != CANONICAL_NAME) {
            return Err(Error::ActionLayout(format!(
                "root folder {} must be named '{CANONICAL_NAME}'",
                root_folder.display()
            )));
        }
        let action_folder = root_folder.join(ACTION_DIR);
        if !action_folder.is_dir() {
            return Err(Error::ActionLayout(format!(
                "missing action folder {}",
                action_folder.display()
            )));
        }
        tracing::debug!("action root resolved to {}", root_folder.display());
        Ok(Self { root_folder, action_folder })
    }

    pub fn canonical_name(&self) -> &'static str {
        CANONICAL_NAME
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn action_folder(&self) -> &Path {
        &self.action_folder
    }

    pub fn linux_steps(&self) -> PathBuf {
        self.action_folder.join("platforms/ubuntu/steps")
    }

    pub fn linux_entrypoint(&self) -> PathBuf {
        self.action_folder.join("platforms/ubuntu/entrypoint.sh")
    }

    pub fn windows_steps(&self) -> PathBuf {
        self.action_folder.join("platforms/windows")
    }

    pub fn blank_project(&self) -> PathBuf {
        self.action_folder.join("BlankProject")
    }
}

#[cfg(test)]
pub(crate) fn fixture() -> (tempfile::TempDir, ActionMetadata) {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join(CANONICAL_NAME);
    std::fs::create_dir_all(root.join(ACTION_DIR)).unwrap();
    let action = ActionMetadata::from_root(&root).unwrap();
    (tmp, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_folder_named_after_tool() {
        let (_tmp, action) = fixture();
        assert_eq!(
            action.root_folder().file_name().unwrap(),
            action.canonical_name()
        );
        assert!(action.root_folder().is_absolute());
        assert!(action.root_folder().exists());
    }

    #[test]
    fn test_action_folder() {
        let (_tmp, action) = fixture();
        assert_eq!(action.action_folder().file_name().unwrap(), ACTION_DIR);
        assert!(action.action_folder().exists());
        assert_eq!(
            action.linux_entrypoint(),
            action.action_folder().join("platforms/ubuntu/entrypoint.sh")
        );
    }

    #[test]
    fn test_discover_from_installed_binary() {
        let (tmp, action) = fixture();
        let exe = action.root_folder().join(CANONICAL_NAME);
        std::fs::write(&exe, b"").unwrap();

        let found = ActionMetadata::discover_from(&exe).unwrap();
        assert_eq!(found, action);
        assert_eq!(found.root_folder(), tmp.path().join(CANONICAL_NAME));

        let nested = action.root_folder().join("bin").join(CANONICAL_NAME);
        std::fs::create_dir_all(nested.parent().unwrap()).unwrap();
        assert_eq!(ActionMetadata::discover_from(&nested).unwrap(), action);
    }

    #[test]
    fn test_discover_from_outside_install() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = tmp.path().join(CANONICAL_NAME);
        std::fs::write(&exe, b"").unwrap();
        let err = ActionMetadata::discover_from(&exe).unwrap_err();
        assert!(err.to_string().contains("no 'unity-test-runner' directory"));
    }

    #[test]
    fn test_wrong_root_name() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("something-else");
        std::fs::create_dir_all(root.join(ACTION_DIR)).unwrap();
        assert!(matches!(
            ActionMetadata::from_root(&root),
            Err(Error::ActionLayout(_))
        ));
    }

    #[test]
    fn test_missing_action_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join(CANONICAL_NAME);
        std::fs::create_dir_all(&root).unwrap();
        let err = ActionMetadata::from_root(&root).unwrap_err();
        assert!(err.to_string().contains("missing action folder"));
    }
}
