// src/runners/models.rs
use serde::Serialize;
use std::fmt;

use crate::models::Secret;

/// Fully-resolved description of one `docker run`.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerInvocation {
    pub image: String,
    pub workdir: String,
    pub env: Vec<EnvBinding>,
    pub volumes: Vec<VolumeMount>,
    pub network: NetworkMode,
    pub entrypoint: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvBinding {
    pub name: String,
    pub value: EnvValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EnvValue {
    /// Passed by name; the container runtime copies the host's value.
    Inherit,
    Literal(String),
    Secret(Secret),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeMount {
    pub host: String,
    pub container: String,
    pub access: AccessMode,
    /// SELinux private relabel (`:z`)
    pub relabel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Default,
    Host,
}

impl EnvBinding {
    pub fn inherit(name: &str) -> Self {
        Self { name: name.to_string(), value: EnvValue::Inherit }
    }

    pub fn literal(name: &str, value: impl Into<String>) -> Self {
        Self { name: name.to_string(), value: EnvValue::Literal(value.into()) }
    }

    pub fn secret(name: &str, value: Secret) -> Self {
        Self { name: name.to_string(), value: EnvValue::Secret(value) }
    }

    fn render(&self, redact: bool) -> String {
        match &self.value {
            EnvValue::Inherit => self.name.clone(),
            EnvValue::Literal(v) => format!("{}={}", self.name, v),
            EnvValue::Secret(_) if redact => format!("{}={}", self.name, Secret::REDACTED),
            EnvValue::Secret(s) => format!("{}={}", self.name, s.expose()),
        }
    }
}

impl VolumeMount {
    pub fn new(host: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            access: AccessMode::ReadWrite,
            relabel: false,
        }
    }

    pub fn relabeled(mut self) -> Self {
        self.relabel = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.access = AccessMode::ReadOnly;
        self
    }

    /// `host:container[:opts]` as accepted by `--volume`.
    pub fn spec(&self) -> String {
        let mut opts = Vec::new();
        if self.access == AccessMode::ReadOnly {
            opts.push("ro");
        }
        if self.relabel {
            opts.push("z");
        }
        if opts.is_empty() {
            format!("{}:{}", self.host, self.container)
        } else {
            format!("{}:{}:{}", self.host, self.container, opts.join(","))
        }
    }
}

impl ContainerInvocation {
    /// Arguments for the `docker` binary, secrets included.
    pub fn to_args(&self) -> Vec<String> {
        self.render(false)
    }

    pub fn redacted_args(&self) -> Vec<String> {
        self.render(true)
    }

    pub fn binding(&self, name: &str) -> Option<&EnvValue> {
        self.env.iter().find(|b| b.name == name).map(|b| &b.value)
    }

    pub fn literal(&self, name: &str) -> Option<&str> {
        match self.binding(name)? {
            EnvValue::Literal(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self, redact: bool) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--workdir".to_string(),
            self.workdir.clone(),
            "--rm".to_string(),
        ];
        for b in &self.env {
            args.push("--env".into());
            args.push(b.render(redact));
        }
        for v in &self.volumes {
            args.push("--volume".into());
            args.push(v.spec());
        }
        if self.network == NetworkMode::Host {
            args.push("--net=host".into());
        }
        args.push(self.image.clone());
        args.extend(self.entrypoint.iter().cloned());
        args
    }
}

/// Shell-style rendering, secrets masked. Meant for logs and dry runs.
impl fmt::Display for ContainerInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("docker")?;
        for arg in self.redacted_args() {
            write!(f, " {}", quote(&arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\"").replace('$', "\\$"))
    }
}
