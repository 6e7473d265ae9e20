pub mod linux;
pub mod models;
pub mod windows;

use std::path::{Path, PathBuf};

use crate::action::ActionMetadata;
use crate::config::{
    CONTAINER_WORKDIR, COVERAGE_RESULTS_PATH, GITHUB_ENV, GITHUB_HOME_DIR, GITHUB_WORKFLOW_DIR,
    LICENSE_ENV, SSH_AGENT_SOCKET,
};
use crate::errors::{Error, Result};
use crate::models::BuildConfiguration;
use crate::platform::Platform;
use models::{ContainerInvocation, EnvBinding, NetworkMode, VolumeMount};

/// Host directories created under the runner temp path before each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPaths {
    pub github_home: PathBuf,
    pub github_workflow: PathBuf,
}

impl StagingPaths {
    pub fn under(runner_temporary_path: &Path) -> Self {
        Self {
            github_home: runner_temporary_path.join(GITHUB_HOME_DIR),
            github_workflow: runner_temporary_path.join(GITHUB_WORKFLOW_DIR),
        }
    }

    /// Creates both directories. Existing directories are left alone.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.github_home, &self.github_workflow] {
            std::fs::create_dir_all(dir).map_err(|source| Error::StagingDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Platform-specific rules for mounts and the entrypoint.
pub trait PlatformStrategy {
    fn platform(&self) -> Platform;
    fn build_invocation(
        &self,
        image: &str,
        config: &BuildConfiguration,
        staging: &StagingPaths,
    ) -> ContainerInvocation;
}

pub fn for_platform<'a>(
    platform: Platform,
    action: &'a ActionMetadata,
) -> Box<dyn PlatformStrategy + 'a> {
    match platform {
        Platform::Linux => Box::new(linux::LinuxStrategy::new(action)),
        Platform::Windows => Box::new(windows::WindowsStrategy::new(action)),
    }
}

// Shared shaping: everything except mounts and entrypoint is platform-neutral.
fn assemble(
    image: &str,
    config: &BuildConfiguration,
    volumes: Vec<VolumeMount>,
    entrypoint: &[&str],
) -> ContainerInvocation {
    ContainerInvocation {
        image: image.to_string(),
        workdir: CONTAINER_WORKDIR.to_string(),
        env: env_bindings(config),
        volumes,
        network: network_mode(config),
        entrypoint: entrypoint.iter().map(|s| s.to_string()).collect(),
    }
}

fn env_bindings(config: &BuildConfiguration) -> Vec<EnvBinding> {
    let mut env: Vec<EnvBinding> = LICENSE_ENV.iter().map(|n| EnvBinding::inherit(n)).collect();

    env.extend([
        EnvBinding::literal("UNITY_VERSION", &config.editor_version),
        EnvBinding::literal("PROJECT_PATH", &config.project_path),
        EnvBinding::literal("CUSTOM_PARAMETERS", &config.custom_parameters),
        EnvBinding::literal("TEST_PLATFORMS", config.test_mode.test_platforms()),
        EnvBinding::literal("COVERAGE_OPTIONS", &config.coverage_options),
        EnvBinding::literal("COVERAGE_RESULTS_PATH", COVERAGE_RESULTS_PATH),
        EnvBinding::literal("ARTIFACTS_PATH", &config.artifacts_path),
        EnvBinding::literal("GITHUB_WORKSPACE", CONTAINER_WORKDIR),
    ]);
    env.extend(GITHUB_ENV.iter().map(|n| EnvBinding::inherit(n)));

    if let Some(token) = &config.git_private_token {
        env.push(EnvBinding::secret("GIT_PRIVATE_TOKEN", token.clone()));
    }
    if config.ssh_agent.is_some() {
        env.push(EnvBinding::literal("SSH_AUTH_SOCK", SSH_AGENT_SOCKET));
    }

    // With a GitHub token the in-container step reports through GitHub and
    // swallows the editor's own exit code.
    let use_exit_code = config.github_token.is_none();
    env.push(EnvBinding::literal("USE_EXIT_CODE", use_exit_code.to_string()));
    env
}

fn network_mode(config: &BuildConfiguration) -> NetworkMode {
    if config.use_host_network { NetworkMode::Host } else { NetworkMode::Default }
}

fn host_path(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[cfg(test)]
pub(crate) fn sample_config(workspace: &str, runner_temp: &Path) -> BuildConfiguration {
    use crate::models::TestMode;
    BuildConfiguration {
        image: "unity-ci:2021".into(),
        editor_version: "2021.3.1f1".into(),
        workspace: workspace.into(),
        project_path: "Project".into(),
        custom_parameters: String::new(),
        test_mode: TestMode::Playmode,
        coverage_options: String::new(),
        artifacts_path: "artifacts".into(),
        use_host_network: false,
        ssh_agent: None,
        git_private_token: None,
        github_token: None,
        runner_temporary_path: runner_temp.to_path_buf(),
    }
}
