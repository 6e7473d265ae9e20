use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The host OS has no platform strategy. Check before building anything.
    #[error("unsupported platform '{0}': only linux and windows hosts can run the build container")]
    UnsupportedPlatform(String),

    #[error("failed to create staging directory {}: {source}", path.display())]
    StagingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container exited non-zero, or was killed by a signal (`code` is `None`).
    #[error("container run failed with {}", describe_exit(*code))]
    Execution { code: Option<i32> },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("docker not found on PATH")]
    DockerNotFound,

    #[error("action layout: {0}")]
    ActionLayout(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "abnormal termination".to_string(),
    }
}
