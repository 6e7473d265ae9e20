use super::models::{ContainerInvocation, VolumeMount};
use super::{assemble, host_path, PlatformStrategy, StagingPaths};
use crate::action::ActionMetadata;
use crate::config::{
    WINDOWS_BLANK_PROJECT, WINDOWS_ENTRYPOINT, WINDOWS_STEPS, WINDOWS_TOOLCHAIN_MOUNTS,
    WINDOWS_WORKSPACE,
};
use crate::models::BuildConfiguration;
use crate::platform::Platform;

/// Runs the powershell entrypoint. The editor needs the host's compiler
/// toolchain and SDKs, so those are mounted in at their own paths.
pub struct WindowsStrategy<'a> {
    action: &'a ActionMetadata,
}

impl<'a> WindowsStrategy<'a> {
    pub fn new(action: &'a ActionMetadata) -> Self {
        Self { action }
    }
}

impl PlatformStrategy for WindowsStrategy<'_> {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    // Staging dirs exist on the host but the windows image doesn't mount them.
    fn build_invocation(
        &self,
        image: &str,
        config: &BuildConfiguration,
        _staging: &StagingPaths,
    ) -> ContainerInvocation {
        let mut volumes = vec![VolumeMount::new(host_path(&config.workspace), WINDOWS_WORKSPACE)];
        volumes.extend(
            WINDOWS_TOOLCHAIN_MOUNTS
                .iter()
                .map(|dir| VolumeMount::new(*dir, *dir)),
        );
        volumes.push(VolumeMount::new(host_path(&self.action.windows_steps()), WINDOWS_STEPS));
        volumes.push(VolumeMount::new(host_path(&self.action.blank_project()), WINDOWS_BLANK_PROJECT));

        assemble(image, config, volumes, &["powershell", WINDOWS_ENTRYPOINT])
    }
}
