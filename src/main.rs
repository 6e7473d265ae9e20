use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unity_test_runner::config::LOG_ENV;
use unity_test_runner::{
    check_compatibility, ActionMetadata, BuildConfiguration, Docker, Error, Platform, Secret,
    TestMode,
};

#[derive(Parser, Debug)]
#[command(name="unity-test-runner", version, about="Run Unity tests in a build container")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose logs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exit non-zero unless this host can run the build container
    Check,
    /// Build the container invocation and run it
    Run {
        #[command(flatten)]
        build: BuildArgs,
        /// Don't echo container output
        #[arg(long)]
        silent: bool,
    },
    /// Print the container invocation without running it (secrets masked)
    Plan {
        #[command(flatten)]
        build: BuildArgs,
        /// Print as JSON instead of a command line
        #[arg(long)]
        json: bool,
    },
}

/// Flags fall back to the GitHub Actions input variables.
#[derive(Args, Debug)]
struct BuildArgs {
    /// JSON build configuration; replaces all other build flags
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, env = "INPUT_CUSTOMIMAGE")]
    image: Option<String>,
    #[arg(long, env = "INPUT_UNITYVERSION")]
    editor_version: Option<String>,
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: Option<PathBuf>,
    #[arg(long, env = "INPUT_PROJECTPATH", default_value = ".")]
    project_path: String,
    #[arg(long, env = "INPUT_CUSTOMPARAMETERS", default_value = "")]
    custom_parameters: String,
    #[arg(long, env = "INPUT_TESTMODE", value_enum, default_value_t = TestMode::All)]
    test_mode: TestMode,
    #[arg(long, env = "INPUT_COVERAGEOPTIONS", default_value = "")]
    coverage_options: String,
    #[arg(long, env = "INPUT_ARTIFACTSPATH", default_value = "artifacts")]
    artifacts_path: String,
    #[arg(long, env = "INPUT_USEHOSTNETWORK")]
    use_host_network: bool,
    #[arg(long, env = "INPUT_SSHAGENT")]
    ssh_agent: Option<String>,
    #[arg(long, env = "INPUT_GITPRIVATETOKEN", hide_env_values = true)]
    git_private_token: Option<String>,
    #[arg(long, env = "INPUT_GITHUBTOKEN", hide_env_values = true)]
    github_token: Option<String>,
    #[arg(long, env = "RUNNER_TEMP")]
    runner_temp: Option<PathBuf>,
}

impl BuildArgs {
    fn into_configuration(self) -> Result<BuildConfiguration> {
        if let Some(path) = &self.config {
            return BuildConfiguration::from_json_file(path)
                .with_context(|| format!("loading build configuration from {}", path.display()));
        }
        Ok(BuildConfiguration {
            image: self.image.ok_or_else(|| anyhow!("--image is required"))?,
            editor_version: self
                .editor_version
                .ok_or_else(|| anyhow!("--editor-version is required"))?,
            workspace: self.workspace.ok_or_else(|| anyhow!("--workspace is required"))?,
            project_path: self.project_path,
            custom_parameters: self.custom_parameters,
            test_mode: self.test_mode,
            coverage_options: self.coverage_options,
            artifacts_path: self.artifacts_path,
            use_host_network: self.use_host_network,
            ssh_agent: self.ssh_agent.filter(|s| !s.is_empty()),
            git_private_token: self.git_private_token.and_then(Secret::new),
            github_token: self.github_token.and_then(Secret::new),
            runner_temporary_path: self
                .runner_temp
                .ok_or_else(|| anyhow!("--runner-temp is required"))?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var(LOG_ENV).unwrap_or_else(|_| filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Check => cmd_check()?,
        Commands::Run { build, silent } => {
            if let Err(e) = cmd_run(build, silent).await {
                // mirror the container's exit code
                if let Some(Error::Execution { code: Some(code) }) = e.downcast_ref::<Error>() {
                    eprintln!("Error: {e:#}");
                    std::process::exit(*code);
                }
                return Err(e);
            }
        }
        Commands::Plan { build, json } => cmd_plan(build, json)?,
    }
    Ok(())
}

fn cmd_check() -> Result<()> {
    check_compatibility()?;
    println!("✓ {} host supported", std::env::consts::OS);
    Ok(())
}

async fn cmd_run(build: BuildArgs, silent: bool) -> Result<()> {
    let platform = Platform::current()?;
    let config = build.into_configuration()?;
    let action = ActionMetadata::global()?;

    let docker = Docker::new(platform, action);
    docker
        .run(&config.image, &config, silent)
        .await
        .with_context(|| format!("running {}", config.image))?;
    println!("✓ Tests completed");
    Ok(())
}

fn cmd_plan(build: BuildArgs, json: bool) -> Result<()> {
    let platform = Platform::current()?;
    let config = build.into_configuration()?;
    let action = ActionMetadata::global()?;

    let invocation = Docker::new(platform, action).prepare(&config.image, &config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&invocation)?);
    } else {
        println!("{invocation}");
    }
    Ok(())
}
