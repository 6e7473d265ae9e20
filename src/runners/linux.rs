use super::models::{ContainerInvocation, VolumeMount};
use super::{assemble, host_path, PlatformStrategy, StagingPaths};
use crate::action::ActionMetadata;
use crate::config::{
    LINUX_ENTRYPOINT, LINUX_HOME, LINUX_STEPS, LINUX_WORKFLOW, LINUX_WORKSPACE, SSH_AGENT_SOCKET,
};
use crate::models::BuildConfiguration;
use crate::platform::Platform;

/// Runs the ubuntu entrypoint through bash. Every mount is relabeled so
/// SELinux hosts let the container read it.
pub struct LinuxStrategy<'a> {
    action: &'a ActionMetadata,
}

impl<'a> LinuxStrategy<'a> {
    pub fn new(action: &'a ActionMetadata) -> Self {
        Self { action }
    }
}

impl PlatformStrategy for LinuxStrategy<'_> {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn build_invocation(
        &self,
        image: &str,
        config: &BuildConfiguration,
        staging: &StagingPaths,
    ) -> ContainerInvocation {
        let mut volumes = vec![
            VolumeMount::new(host_path(&staging.github_home), LINUX_HOME),
            VolumeMount::new(host_path(&staging.github_workflow), LINUX_WORKFLOW),
            VolumeMount::new(host_path(&config.workspace), LINUX_WORKSPACE),
            VolumeMount::new(host_path(&self.action.linux_steps()), LINUX_STEPS),
            VolumeMount::new(host_path(&self.action.linux_entrypoint()), LINUX_ENTRYPOINT),
        ];
        // forwarded SSH_AUTH_SOCK points here
        if let Some(socket) = &config.ssh_agent {
            volumes.push(VolumeMount::new(socket.as_str(), SSH_AGENT_SOCKET));
        }
        let volumes = volumes.into_iter().map(VolumeMount::relabeled).collect();

        assemble(image, config, volumes, &["/bin/bash", "-c", LINUX_ENTRYPOINT])
    }
}
