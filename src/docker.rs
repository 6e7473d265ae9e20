use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use which::which;

use crate::action::ActionMetadata;
use crate::errors::{Error, Result};
use crate::models::BuildConfiguration;
use crate::platform::Platform;
use crate::runners::models::ContainerInvocation;
use crate::runners::{self, StagingPaths};

pub const DOCKER: &str = "docker";

/// How the container process ended. `code` is `None` when it was killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub code: Option<i32>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Launches a built invocation and waits for it to exit.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    async fn exec(&self, invocation: &ContainerInvocation, silent: bool) -> Result<RunOutcome>;
}

/// Runs invocations through a local docker binary (`docker` on PATH by default).
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::with_program(DOCKER)
    }
}

impl DockerCli {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn { program: self.program.display().to_string(), source }
    }
}

#[async_trait::async_trait]
impl Executor for DockerCli {
    async fn exec(&self, invocation: &ContainerInvocation, silent: bool) -> Result<RunOutcome> {
        let program = which(&self.program).map_err(|_| Error::DockerNotFound)?;

        let mut child = Command::new(program)
            .args(invocation.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let pump_out = child.stdout.take().map(|out| {
            tokio::spawn(pump(out, "[container][stdout] ", (!silent).then(tokio::io::stdout)))
        });
        let pump_err = child.stderr.take().map(|err| {
            tokio::spawn(pump(err, "[container][stderr] ", (!silent).then(tokio::io::stderr)))
        });

        let status = child.wait().await.map_err(|source| self.spawn_error(source))?;
        for handle in [pump_out, pump_err].into_iter().flatten() {
            match handle.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("reading container output failed: {e}"),
                Err(e) => tracing::warn!("container output task did not finish: {e}"),
            }
        }

        Ok(RunOutcome { code: status.code() })
    }
}

// Drains a child stream to EOF so the child never blocks or hits a closed
// pipe. Lines are decoded lossily and echoed with `tag` while `echo` is set.
// Returns the number of lines read.
async fn pump<R, W>(reader: R, tag: &str, mut echo: Option<W>) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(lines);
        }
        lines += 1;
        if let Some(out) = echo.as_mut() {
            let text = String::from_utf8_lossy(&buf);
            let line = format!("{tag}{}\n", text.trim_end_matches(['\n', '\r']));
            if out.write_all(line.as_bytes()).await.is_err() {
                // keep draining even if our own output is gone
                echo = None;
            }
        }
    }
}

/// Turns a build configuration into one container run on the given platform.
pub struct Docker<'a, E = DockerCli> {
    platform: Platform,
    action: &'a ActionMetadata,
    executor: E,
}

impl<'a> Docker<'a> {
    pub fn new(platform: Platform, action: &'a ActionMetadata) -> Self {
        Self::with_executor(platform, action, DockerCli::default())
    }
}

impl<'a, E: Executor> Docker<'a, E> {
    pub fn with_executor(platform: Platform, action: &'a ActionMetadata, executor: E) -> Self {
        Self { platform, action, executor }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Creates the staging directories and builds the invocation, without running it.
    pub fn prepare(&self, image: &str, config: &BuildConfiguration) -> Result<ContainerInvocation> {
        let staging = StagingPaths::under(&config.runner_temporary_path);
        staging.ensure()?;
        tracing::debug!(
            "staged {} and {}",
            staging.github_home.display(),
            staging.github_workflow.display()
        );

        let strategy = runners::for_platform(self.platform, self.action);
        Ok(strategy.build_invocation(image, config, &staging))
    }

    /// Builds and runs the container, failing on any non-zero or abnormal exit.
    pub async fn run(
        &self,
        image: &str,
        config: &BuildConfiguration,
        silent: bool,
    ) -> Result<RunOutcome> {
        let invocation = self.prepare(image, config)?;
        tracing::info!("running on {}: {}", self.platform, invocation);

        let outcome = self.executor.exec(&invocation, silent).await?;
        if !outcome.success() {
            tracing::warn!("container exited with {:?}", outcome.code);
            return Err(Error::Execution { code: outcome.code });
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::sample_config;
    use std::sync::Mutex;

    struct Recorder {
        code: Option<i32>,
        calls: Mutex<Vec<(Vec<String>, bool)>>,
        staged: Mutex<Vec<bool>>,
        runner_temp: PathBuf,
    }

    impl Recorder {
        fn new(code: Option<i32>, runner_temp: PathBuf) -> Self {
            Self { code, calls: Mutex::new(vec![]), staged: Mutex::new(vec![]), runner_temp }
        }
    }

    #[async_trait::async_trait]
    impl Executor for Recorder {
        async fn exec(&self, invocation: &ContainerInvocation, silent: bool) -> Result<RunOutcome> {
            let staged = self.runner_temp.join("_github_home").is_dir()
                && self.runner_temp.join("_github_workflow").is_dir();
            self.staged.lock().unwrap().push(staged);
            self.calls.lock().unwrap().push((invocation.to_args(), silent));
            Ok(RunOutcome { code: self.code })
        }
    }

    #[tokio::test]
    async fn test_run_stages_then_executes() {
        let (_tmp, action) = crate::action::fixture();
        let runner = tempfile::tempdir().unwrap();
        let cfg = sample_config("/repo", runner.path());
        let docker = Docker::with_executor(
            Platform::Linux,
            &action,
            Recorder::new(Some(0), runner.path().to_path_buf()),
        );

        let outcome = docker.run("unity-ci:2021", &cfg, true).await.unwrap();
        assert!(outcome.success());

        let calls = docker.executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (args, silent) = &calls[0];
        assert!(*silent);
        assert_eq!(args[0], "run");
        assert!(args.contains(&"unity-ci:2021".to_string()));
        assert!(args.contains(&"/repo:/github/workspace:z".to_string()));
        assert_eq!(*docker.executor.staged.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_run_is_repeatable() {
        let (_tmp, action) = crate::action::fixture();
        let runner = tempfile::tempdir().unwrap();
        let cfg = sample_config("/repo", runner.path());
        let docker = Docker::with_executor(
            Platform::Windows,
            &action,
            Recorder::new(Some(0), runner.path().to_path_buf()),
        );

        docker.run("img", &cfg, false).await.unwrap();
        docker.run("img", &cfg, false).await.unwrap();
        assert_eq!(docker.executor.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_propagated() {
        let (_tmp, action) = crate::action::fixture();
        let runner = tempfile::tempdir().unwrap();
        let cfg = sample_config("/repo", runner.path());

        let docker = Docker::with_executor(
            Platform::Linux,
            &action,
            Recorder::new(Some(2), runner.path().to_path_buf()),
        );
        let err = docker.run("img", &cfg, false).await.unwrap_err();
        assert!(matches!(err, Error::Execution { code: Some(2) }));

        let docker = Docker::with_executor(
            Platform::Linux,
            &action,
            Recorder::new(None, runner.path().to_path_buf()),
        );
        let err = docker.run("img", &cfg, false).await.unwrap_err();
        assert!(matches!(err, Error::Execution { code: None }));
        assert!(err.to_string().contains("abnormal termination"));
    }

    #[tokio::test]
    async fn test_staging_failure_skips_execution() {
        let (_tmp, action) = crate::action::fixture();
        let runner = tempfile::tempdir().unwrap();
        std::fs::write(runner.path().join("_github_workflow"), b"").unwrap();
        let cfg = sample_config("/repo", runner.path());
        let docker = Docker::with_executor(
            Platform::Linux,
            &action,
            Recorder::new(Some(0), runner.path().to_path_buf()),
        );

        let err = docker.run("img", &cfg, false).await.unwrap_err();
        assert!(matches!(err, Error::StagingDirectory { .. }));
        assert!(docker.executor.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_prepare_uses_given_image() {
        let (_tmp, action) = crate::action::fixture();
        let runner = tempfile::tempdir().unwrap();
        let cfg = sample_config("/repo", runner.path());
        let docker = Docker::new(Platform::Linux, &action);

        let inv = docker.prepare("other:1", &cfg).unwrap();
        assert_eq!(inv.image, "other:1");
        assert!(runner.path().join("_github_home").is_dir());
    }

    #[tokio::test]
    async fn test_pump_keeps_reading_past_invalid_utf8() {
        let input: &[u8] = b"ok\n\xff\xfebad\r\nlast";
        let mut echoed = Vec::new();

        let lines = pump(input, "[t] ", Some(&mut echoed)).await.unwrap();
        assert_eq!(lines, 3);
        assert_eq!(
            String::from_utf8(echoed).unwrap(),
            "[t] ok\n[t] \u{FFFD}\u{FFFD}bad\n[t] last\n"
        );
    }

    #[tokio::test]
    async fn test_pump_silent_still_drains() {
        let input: &[u8] = b"a\nb\nc\n";
        let lines = pump(input, "[t] ", None::<&mut Vec<u8>>).await.unwrap();
        assert_eq!(lines, 3);
    }

    #[cfg(unix)]
    fn fake_docker(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    // Both scripts are written before anything is spawned.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_docker_cli_outcomes() {
        let (_tmp, action) = crate::action::fixture();
        let runner = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        let cfg = sample_config("/repo", runner.path());

        let noisy = fake_docker(
            bin.path(),
            "docker-noisy",
            "printf 'ok\\n\\377\\376bad\\n'\n\
             i=0; while [ $i -lt 20000 ]; do echo \"line $i\"; i=$((i+1)); done\n\
             echo done >&2\n\
             exit 0",
        );
        let failing = fake_docker(bin.path(), "docker-failing", "echo \"$@\" >&2\nexit 3");

        for silent in [true, false] {
            let docker =
                Docker::with_executor(Platform::Linux, &action, DockerCli::with_program(&noisy));
            let outcome = docker.run("img", &cfg, silent).await.unwrap();
            assert_eq!(outcome, RunOutcome { code: Some(0) });
        }

        let docker =
            Docker::with_executor(Platform::Linux, &action, DockerCli::with_program(&failing));
        let err = docker.run("img", &cfg, true).await.unwrap_err();
        assert!(matches!(err, Error::Execution { code: Some(3) }));

        let missing = DockerCli::with_program(bin.path().join("no-such-docker"));
        let docker = Docker::with_executor(Platform::Linux, &action, missing);
        let err = docker.run("img", &cfg, true).await.unwrap_err();
        assert!(matches!(err, Error::DockerNotFound));
    }
}
