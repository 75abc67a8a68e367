//! Setup-failure reporting from the isolated child to the launcher.
//!
//! Both ends of the pipe are close-on-exec. A child that reaches `execvp`
//! closes its write end implicitly, so the launcher reads EOF with no
//! payload. A child that fails writes one JSON [`SetupReport`] and exits.

use std::fs::File;
use std::io::{Read, Write};

use corral_common::error::{CorralError, FailureKind, Result};
use corral_common::types::SetupPhase;
use nix::fcntl::OFlag;
use serde::{Deserialize, Serialize};

/// What the child tells the launcher about a failed setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupReport {
    /// Phase the child was in when it failed.
    pub phase: SetupPhase,
    /// Classification of the failure.
    pub kind: FailureKind,
    /// Exit status the child is about to terminate with.
    pub exit_code: i32,
    /// Raw OS error number, if any.
    pub errno: Option<i32>,
    /// Rendered error message.
    pub message: String,
}

impl SetupReport {
    /// Builds the report for `error` raised during `phase`.
    ///
    /// Errors without a setup classification are attributed to the phase.
    #[must_use]
    pub fn from_error(phase: SetupPhase, error: &CorralError) -> Self {
        let (kind, exit_code) = match error.kind() {
            Some(kind) => (kind, error.exit_code()),
            None => {
                let kind = FailureKind::from(phase);
                (kind, kind.exit_code())
            }
        };
        Self {
            phase,
            kind,
            exit_code,
            errno: error.errno(),
            message: error.to_string(),
        }
    }
}

/// Creates a close-on-exec report pipe.
///
/// # Errors
///
/// Returns [`CorralError::Namespace`] if `pipe2(2)` fails.
pub fn channel() -> Result<(ReportReader, ReportWriter)> {
    let (read_fd, write_fd) =
        nix::unistd::pipe2(OFlag::O_CLOEXEC).map_err(|e| CorralError::Namespace {
            operation: "pipe2",
            source: e,
        })?;
    Ok((
        ReportReader {
            file: File::from(read_fd),
        },
        ReportWriter {
            file: File::from(write_fd),
        },
    ))
}

/// Launcher end of the report pipe.
#[derive(Debug)]
pub struct ReportReader {
    file: File,
}

impl ReportReader {
    /// Blocks until every write end is closed and returns the report, if
    /// one was sent.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Io`] if reading fails or
    /// [`CorralError::Serialization`] if the payload is not a report.
    pub fn receive(mut self) -> Result<Option<SetupReport>> {
        let mut buf = Vec::new();
        let _ = self
            .file
            .read_to_end(&mut buf)
            .map_err(|e| CorralError::Io {
                path: "<report pipe>".into(),
                source: e,
            })?;
        if buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&buf)?))
    }
}

/// Child end of the report pipe.
#[derive(Debug)]
pub struct ReportWriter {
    file: File,
}

impl ReportWriter {
    /// Writes `report` in a single `write(2)`.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Serialization`] or [`CorralError::Io`].
    pub fn send(&self, report: &SetupReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;
        (&self.file)
            .write_all(&payload)
            .map_err(|e| CorralError::Io {
                path: "<report pipe>".into(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use nix::errno::Errno;

    use super::*;

    #[test]
    fn closed_writer_without_report_yields_none() {
        let (reader, writer) = channel().unwrap();
        drop(writer);
        assert_eq!(reader.receive().unwrap(), None);
    }

    #[test]
    fn report_crosses_the_pipe() {
        let (reader, writer) = channel().unwrap();
        let err = CorralError::Exec {
            command: "/bin/missing".into(),
            source: Errno::ENOENT,
        };
        let report = SetupReport::from_error(SetupPhase::Exec, &err);
        writer.send(&report).unwrap();
        drop(writer);

        let received = reader.receive().unwrap().expect("report");
        assert_eq!(received, report);
        assert_eq!(received.kind, FailureKind::Exec);
        assert_eq!(received.exit_code, 127);
        assert_eq!(received.errno, Some(Errno::ENOENT as i32));
        assert!(received.message.contains("/bin/missing"));
    }

    #[test]
    fn unclassified_error_takes_phase_kind() {
        let err = CorralError::Config {
            message: "argument contains NUL".into(),
        };
        let report = SetupReport::from_error(SetupPhase::Devices, &err);
        assert_eq!(report.kind, FailureKind::DeviceInit);
        assert_eq!(report.exit_code, FailureKind::DeviceInit.exit_code());
        assert_eq!(report.errno, None);
    }

    #[test]
    fn garbage_payload_is_a_serialization_error() {
        let (reader, writer) = channel().unwrap();
        (&writer.file).write_all(b"not json").unwrap();
        drop(writer);
        assert!(matches!(
            reader.receive(),
            Err(CorralError::Serialization { .. })
        ));
    }
}
