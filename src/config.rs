// Fixed names and paths baked into every invocation. Not user-configurable.
pub const CANONICAL_NAME: &str = "unity-test-runner";
pub const ACTION_DIR: &str = "dist";

// Overrides where the installed action lives (defaults to the executable's location)
pub const ROOT_ENV: &str = "UNITY_TEST_RUNNER_ROOT";
// Log filter, same syntax as RUST_LOG
pub const LOG_ENV: &str = "UNITY_TEST_RUNNER_LOG";

pub const GITHUB_HOME_DIR: &str = "_github_home";
pub const GITHUB_WORKFLOW_DIR: &str = "_github_workflow";

pub const CONTAINER_WORKDIR: &str = "/github/workspace";
pub const COVERAGE_RESULTS_PATH: &str = "CodeCoverage";
pub const SSH_AGENT_SOCKET: &str = "/ssh-agent";
pub const COMBINE_RESULTS: &str = "COMBINE_RESULTS";

// Build-tool license/credential variables, forwarded by name only
pub const LICENSE_ENV: &[&str] = &[
    "UNITY_LICENSE",
    "UNITY_LICENSE_FILE",
    "UNITY_EMAIL",
    "UNITY_PASSWORD",
    "UNITY_SERIAL",
];

// Upstream CI variables, forwarded by name only
pub const GITHUB_ENV: &[&str] = &[
    "GITHUB_REF",
    "GITHUB_SHA",
    "GITHUB_REPOSITORY",
    "GITHUB_ACTOR",
    "GITHUB_WORKFLOW",
    "GITHUB_HEAD_REF",
    "GITHUB_BASE_REF",
    "GITHUB_EVENT_NAME",
    "GITHUB_ACTION",
    "GITHUB_EVENT_PATH",
    "RUNNER_OS",
    "RUNNER_TOOL_CACHE",
    "RUNNER_TEMP",
    "RUNNER_WORKSPACE",
];

// Linux
pub const LINUX_WORKSPACE: &str = "/github/workspace";
pub const LINUX_HOME: &str = "/root";
pub const LINUX_WORKFLOW: &str = "/github/workflow";
pub const LINUX_STEPS: &str = "/steps";
pub const LINUX_ENTRYPOINT: &str = "/entrypoint.sh";

// Windows
pub const WINDOWS_WORKSPACE: &str = "c:/github/workspace";
pub const WINDOWS_STEPS: &str = "c:/steps";
pub const WINDOWS_BLANK_PROJECT: &str = "c:/BlankProject";
pub const WINDOWS_ENTRYPOINT: &str = "c:/steps/entrypoint.ps1";

// Host toolchain directories the Windows image builds against, mounted at the same path
pub const WINDOWS_TOOLCHAIN_MOUNTS: &[&str] = &[
    "c:/regkeys",
    "C:/Program Files (x86)/Microsoft Visual Studio",
    "C:/Program Files (x86)/Windows Kits",
    "C:/ProgramData/Microsoft/VisualStudio",
];
