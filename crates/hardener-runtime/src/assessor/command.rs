//! External assessor invoked as a subprocess.
//!
//! Runs `<command> audit [--config <cfg>] --format json [--output-file <report>] [extra..] <artifact>`
//! inside a scratch directory that is removed when the call returns.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use hardener_core::{Artifact, AuditResult};

use super::report::parse_audit_report_str;
use super::{Assessor, AssessorFailure};
use crate::config::{AssessorConfig, ReportMode};

const ARTIFACT_FILE: &str = "artifact.yaml";
const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone)]
pub struct CommandAssessor {
    config: AssessorConfig,
}

impl CommandAssessor {
    pub fn new(config: AssessorConfig) -> Self {
        Self { config }
    }

    fn command(&self, artifact_path: &std::path::Path, report_path: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.arg("audit");
        if let Some(config_path) = &self.config.config_path {
            cmd.arg("--config").arg(config_path);
        }
        cmd.args(["--format", "json"]);
        if self.config.report == ReportMode::File {
            cmd.arg("--output-file").arg(report_path);
        }
        cmd.args(&self.config.extra_args)
            .arg(artifact_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out call drops the future; take the child with it.
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Assessor for CommandAssessor {
    async fn assess(&self, artifact: &Artifact) -> Result<AuditResult, AssessorFailure> {
        let scratch = tempfile::tempdir()?;
        let artifact_path = scratch.path().join(ARTIFACT_FILE);
        let report_path = scratch.path().join(REPORT_FILE);
        tokio::fs::write(&artifact_path, artifact.text()).await?;

        let output = self
            .command(&artifact_path, &report_path)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    AssessorFailure::Unavailable(format!("{}: {}", self.config.command, e))
                }
                _ => AssessorFailure::Io(e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(
            command = %self.config.command,
            status = ?output.status.code(),
            stderr = %stderr.trim(),
            "Assessor exited"
        );

        let text = match self.config.report {
            ReportMode::File => match tokio::fs::read_to_string(&report_path).await {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(AssessorFailure::MissingReport(format!(
                        "exit status {:?}: {}",
                        output.status.code(),
                        stderr.trim()
                    )));
                }
                Err(e) => return Err(AssessorFailure::Io(e)),
            },
            ReportMode::Stdout => String::from_utf8_lossy(&output.stdout).into_owned(),
        };

        parse_audit_report_str(&text)
    }

    fn name(&self) -> &str {
        &self.config.command
    }
}
