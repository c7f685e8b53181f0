// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker CLI pod client
//!
//! A pod is materialized as one container per container spec, named
//! `<pod-id>-<container>` and labelled with the pod id so that the whole pod
//! can be found again by label.

use super::{PodClient, PodError};
use async_trait::async_trait;
use kiln_core::{ContainerExit, ContainerSpec, CreateOutcome, PodId, PodSpec, PodState, RestartPolicy};
use std::path::PathBuf;
use tokio::process::Command;

/// Label carrying the owning pod id on every container
pub const POD_LABEL: &str = "kiln.pod";

/// Exit status docker uses when the daemon itself rejects a command
const DAEMON_ERROR_EXIT: i32 = 125;

/// Pod client driving a local Docker daemon through the `docker` CLI
#[derive(Clone, Debug)]
pub struct DockerPodClient {
    binary: PathBuf,
}

impl Default for DockerPodClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerPodClient {
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Use a specific docker-compatible binary
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[String]) -> Result<String, PodError> {
        let output = Command::new(&self.binary).args(args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if is_name_conflict(output.status.code(), &stderr) {
                return Err(PodError::NameInUse(stderr));
            }
            return Err(PodError::CommandFailed(stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Names of all containers belonging to a pod, sorted
    async fn containers(&self, id: &PodId) -> Result<Vec<String>, PodError> {
        let stdout = self
            .run(&[
                "ps".to_string(),
                "-a".to_string(),
                "--filter".to_string(),
                format!("label={}={}", POD_LABEL, id),
                "--format".to_string(),
                "{{.Names}}".to_string(),
            ])
            .await?;
        let mut names: Vec<String> = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Force-remove containers started for a pod that could not be completed
    async fn remove(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        let mut args = vec!["rm".to_string(), "--force".to_string()];
        args.extend(names.iter().cloned());
        if let Err(e) = self.run(&args).await {
            tracing::warn!(containers = ?names, error = %e, "failed to remove partial pod");
        }
    }
}

/// Whether a failed docker command was rejected because a container name is taken
pub(crate) fn is_name_conflict(code: Option<i32>, stderr: &str) -> bool {
    code == Some(DAEMON_ERROR_EXIT) && stderr.contains("is already in use")
}

pub(crate) fn container_name(pod: &PodId, container: &ContainerSpec) -> String {
    format!("{}-{}", pod, container.name)
}

fn restart_flag(policy: RestartPolicy) -> &'static str {
    match policy {
        RestartPolicy::Always => "always",
        RestartPolicy::OnFailure => "on-failure",
        RestartPolicy::Never => "no",
    }
}

/// Arguments for `docker run` starting one container of a pod
pub(crate) fn run_args(spec: &PodSpec, container: &ContainerSpec) -> Result<Vec<String>, String> {
    let mut args = vec![
        "run".to_string(),
        "--detach".to_string(),
        "--name".to_string(),
        container_name(&spec.id, container),
        "--label".to_string(),
        format!("{}={}", POD_LABEL, spec.id),
        "--restart".to_string(),
        restart_flag(spec.restart_policy).to_string(),
    ];

    for (key, value) in &spec.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }

    for var in &container.env {
        args.push("--env".to_string());
        args.push(format!("{}={}", var.name, var.value));
    }

    for mount in &container.volume_mounts {
        let volume = spec.volume(&mount.name).ok_or_else(|| {
            format!(
                "container {} mounts undeclared volume {}",
                container.name, mount.name
            )
        })?;
        let mut binding = format!(
            "{}:{}",
            volume.host_path.display(),
            mount.mount_path.display()
        );
        if mount.read_only {
            binding.push_str(":ro");
        }
        args.push("--volume".to_string());
        args.push(binding);
    }

    if container.privileged {
        args.push("--privileged".to_string());
    }

    args.push(container.image.clone());
    args.extend(container.command.iter().cloned());
    Ok(args)
}

/// Parse one line of `docker inspect --format '{{.State.Status}} {{.State.ExitCode}}'`
///
/// Returns the exit code once the container has stopped, `None` while it is
/// still created, running, paused or restarting.
pub(crate) fn parse_state(line: &str) -> Result<Option<i32>, PodError> {
    let mut parts = line.split_whitespace();
    let (Some(status), Some(code)) = (parts.next(), parts.next()) else {
        return Err(PodError::Parse(line.to_string()));
    };
    match status {
        "exited" | "dead" => code
            .parse()
            .map(Some)
            .map_err(|_| PodError::Parse(line.to_string())),
        _ => Ok(None),
    }
}

#[async_trait]
impl PodClient for DockerPodClient {
    async fn create(&self, spec: &PodSpec) -> CreateOutcome {
        match self.containers(&spec.id).await {
            Ok(existing) if !existing.is_empty() => return CreateOutcome::Conflict,
            Ok(_) => {}
            Err(e) => return CreateOutcome::Failed(e.to_string()),
        }

        let mut runs = Vec::with_capacity(spec.containers.len());
        for container in &spec.containers {
            match run_args(spec, container) {
                Ok(args) => runs.push((container_name(&spec.id, container), args)),
                Err(reason) => return CreateOutcome::Failed(reason),
            }
        }

        let mut started = Vec::with_capacity(runs.len());
        for (name, args) in runs {
            match self.run(&args).await {
                Ok(_) => started.push(name),
                // Lost a race with another submission of the same pod
                Err(PodError::NameInUse(_)) if started.is_empty() => {
                    return CreateOutcome::Conflict;
                }
                Err(e) => {
                    self.remove(&started).await;
                    return CreateOutcome::Failed(e.to_string());
                }
            }
        }

        CreateOutcome::Created(spec.id.clone())
    }

    async fn get(&self, id: &PodId) -> Result<PodState, PodError> {
        let names = self.containers(id).await?;
        if names.is_empty() {
            return Err(PodError::NotFound(id.clone()));
        }

        let prefix = format!("{}-", id);
        let mut exits = Vec::with_capacity(names.len());
        for name in names {
            let line = self
                .run(&[
                    "inspect".to_string(),
                    "--format".to_string(),
                    "{{.State.Status}} {{.State.ExitCode}}".to_string(),
                    name.clone(),
                ])
                .await?;
            let Some(exit_code) = parse_state(line.trim())? else {
                return Ok(PodState::NonTerminal);
            };
            let container = name.strip_prefix(&prefix).unwrap_or(&name).to_string();
            exits.push(ContainerExit::new(container, exit_code));
        }

        Ok(PodState::Terminated(exits))
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
