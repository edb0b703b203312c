//! Reproducibility log
//!
//! Each analysis step is stored as a typed [`Operation`] holding the
//! parameters it ran with (factors requested and applied, the integration
//! window and channel, export target, warnings). The text report, the JSON
//! dump and the replay script are all rendered from those parameters, so a
//! replayed `esr-analyze` command always matches what was recorded.

use chrono::{DateTime, Local};
use esr_core::FileType;
use esr_io::EsrWarning;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use crate::data::series::Channel;
use crate::pipeline::integrate::IntegrationWindow;

const PROGRAM: &str = "esr-analyze";

/// Quote an argument for a POSIX shell when it needs it.
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./+:=".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

// =========================================================================
//  Operations
// =========================================================================

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Load {
        file_type: FileType,
        samples: usize,
        gain: f64,
        reduction_factor: i64,
    },
    Reduce {
        requested: i64,
        applied: i64,
        points: usize,
        reduced_points: usize,
    },
    Integrate {
        reduction_factor: i64,
        window: IntegrationWindow,
        channel: Channel,
        area: f64,
    },
    Export {
        target: String,
        samples: usize,
    },
    /// A non-fatal problem met by the step before it.
    Warning { warning: EsrWarning },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Load { .. } => "load",
            Operation::Reduce { .. } => "reduce",
            Operation::Integrate { .. } => "integrate",
            Operation::Export { .. } => "export",
            Operation::Warning { .. } => "warning",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Operation::Load {
                file_type,
                samples,
                gain,
                reduction_factor,
            } => format!(
                "{} file, {} samples, gain {}, reduction factor {}",
                file_type, samples, gain, reduction_factor
            ),
            Operation::Reduce {
                requested,
                applied,
                points,
                reduced_points,
            } => {
                let mut d = format!("factor {}: {} -> {} points", applied, points, reduced_points);
                if requested != applied {
                    d.push_str(&format!(" (requested {})", requested));
                }
                d
            }
            Operation::Integrate {
                window,
                channel,
                area,
                ..
            } => {
                let mut d = format!("{} over [{}, {}] = {}", channel, window.start, window.end, area);
                if let Some(c) = window.constant {
                    d.push_str(&format!(" (constant {})", c));
                }
                d
            }
            Operation::Export { target, samples } => {
                format!("{} raw samples to {}", samples, target)
            }
            Operation::Warning { warning } => warning.to_string(),
        }
    }

    /// Arguments after the input file that repeat this step. Warnings
    /// have none.
    pub fn cli_args(&self) -> Option<Vec<String>> {
        let args = match self {
            Operation::Load {
                reduction_factor, ..
            } => vec!["--reduce".to_string(), reduction_factor.to_string()],
            Operation::Reduce { applied, .. } => {
                vec!["--reduce".to_string(), applied.to_string()]
            }
            Operation::Integrate {
                reduction_factor,
                window,
                channel,
                ..
            } => {
                let mut a = vec![
                    "--reduce".to_string(),
                    reduction_factor.to_string(),
                    "--window".to_string(),
                    window.start.to_string(),
                    window.end.to_string(),
                ];
                if let Some(c) = window.constant {
                    a.push("--constant".to_string());
                    a.push(c.to_string());
                }
                if channel.is_normalized() {
                    a.push("--norm".to_string());
                }
                if channel.is_imaginary() {
                    a.push("--imag".to_string());
                }
                a
            }
            Operation::Export { target, .. } => vec!["--export".to_string(), target.clone()],
            Operation::Warning { .. } => return None,
        };
        Some(args)
    }
}

/// An operation with its position and time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub operation: Operation,
}

impl LogEntry {
    /// `esr-analyze` invocation repeating this entry on `source`.
    pub fn command_line(&self, source: &str) -> Option<String> {
        let args = self.operation.cli_args()?;
        let mut cmd = format!("{} {}", PROGRAM, shell_quote(source));
        for a in &args {
            cmd.push(' ');
            cmd.push_str(&shell_quote(a));
        }
        Some(cmd)
    }
}

// =========================================================================
//  Log
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub source_file: String,
    pub software_version: String,
    entries: Vec<LogEntry>,
}

impl ReproLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            source_file: String::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    pub fn set_source(&mut self, source: &str) {
        self.source_file = source.to_string();
    }

    pub fn record(&mut self, operation: Operation) {
        let sequence = self.entries.len() + 1;
        log::info!(
            "[step {:03}] {}: {}",
            sequence,
            operation.name(),
            operation.description()
        );
        self.entries.push(LogEntry {
            sequence,
            timestamp: Local::now(),
            operation,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Command line of the entry at `index`, if it has one.
    pub fn command_line(&self, index: usize) -> Option<String> {
        self.entries.get(index)?.command_line(&self.source_file)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("ESR analysis log\n");
        out.push_str(&format!("session   {}\n", self.session_id));
        out.push_str(&format!(
            "started   {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("source    {}\n", self.source_file));
        out.push_str(&format!("version   {} {}\n\n", PROGRAM, self.software_version));

        for e in &self.entries {
            out.push_str(&format!(
                "#{:<3} {} {:<9} {}\n",
                e.sequence,
                e.timestamp.format("%H:%M:%S"),
                e.operation.name(),
                e.operation.description()
            ));
            if let Some(cmd) = e.command_line(&self.source_file) {
                out.push_str(&format!("     $ {}\n", cmd));
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// POSIX shell script replaying every step that has a command line;
    /// warnings are kept as comments.
    pub fn to_shell_script(&self) -> String {
        let mut out = String::from("#!/bin/sh\n");
        out.push_str(&format!(
            "# {} {} session {} ({})\n",
            PROGRAM,
            self.software_version,
            self.session_id,
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str("set -eu\n\n");
        for e in &self.entries {
            match e.command_line(&self.source_file) {
                Some(cmd) => out.push_str(&format!("{}\n", cmd)),
                None => out.push_str(&format!(
                    "# {}: {}\n",
                    e.operation.name(),
                    e.operation.description()
                )),
            }
        }
        out
    }

    pub fn save_text(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_json()?)
    }

    pub fn save_script(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_shell_script())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }
}

impl Default for ReproLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrate_op(constant: Option<f64>, channel: Channel) -> Operation {
        Operation::Integrate {
            reduction_factor: 4,
            window: IntegrationWindow {
                start: 330.0,
                end: 340.5,
                constant,
            },
            channel,
            area: 12.5,
        }
    }

    #[test]
    fn test_commands_are_built_from_parameters() {
        let mut log = ReproLog::new();
        log.set_source("runs/dpph 01.esr");
        log.record(Operation::Load {
            file_type: FileType::RawBinary,
            samples: 1024,
            gain: 20.0,
            reduction_factor: 1,
        });
        log.record(integrate_op(Some(-0.5), Channel::ImaginaryNormalized));
        log.record(Operation::Warning {
            warning: EsrWarning::ZeroGain,
        });

        assert_eq!(
            log.command_line(0).unwrap(),
            "esr-analyze 'runs/dpph 01.esr' --reduce 1"
        );
        assert_eq!(
            log.command_line(1).unwrap(),
            "esr-analyze 'runs/dpph 01.esr' --reduce 4 --window 330 340.5 --constant -0.5 --norm --imag"
        );
        assert_eq!(log.command_line(2), None);
        assert_eq!(log.command_line(3), None);
        assert_eq!(log.entries()[2].sequence, 3);
    }

    #[test]
    fn test_reduce_description_shows_correction() {
        let op = Operation::Reduce {
            requested: 0,
            applied: 1,
            points: 8,
            reduced_points: 8,
        };
        assert_eq!(op.description(), "factor 1: 8 -> 8 points (requested 0)");
        assert_eq!(op.cli_args().unwrap(), vec!["--reduce", "1"]);
    }

    #[test]
    fn test_text_export() {
        let mut log = ReproLog::new();
        log.set_source("sample.esr");
        log.record(integrate_op(None, Channel::Real));
        let text = log.to_text();
        assert!(text.contains("source    sample.esr"));
        assert!(text.contains("integrate real over [330, 340.5] = 12.5"));
        assert!(text.contains("$ esr-analyze sample.esr --reduce 4 --window 330 340.5\n"));
    }

    #[test]
    fn test_json_keeps_typed_parameters() {
        let mut log = ReproLog::new();
        log.record(integrate_op(Some(1.0), Channel::RealNormalized));
        log.record(Operation::Warning {
            warning: EsrWarning::InvalidReductionFactor {
                requested: 50,
                applied: 10,
            },
        });
        let json = log.to_json().unwrap();
        assert!(json.contains("\"op\": \"integrate\""));

        let parsed: ReproLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id, log.session_id);
        assert_eq!(parsed.entries()[0].operation, log.entries()[0].operation);
        assert_eq!(parsed.entries()[1].operation, log.entries()[1].operation);
    }

    #[test]
    fn test_shell_script_export() {
        let mut log = ReproLog::new();
        log.set_source("a.esr");
        log.record(Operation::Export {
            target: "out.root".to_string(),
            samples: 8,
        });
        log.record(Operation::Warning {
            warning: EsrWarning::ZeroGain,
        });
        let script = log.to_shell_script();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("\nesr-analyze a.esr --export out.root\n"));
        assert!(script.contains("# warning: gain is zero"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("data/run_1.esr"), "data/run_1.esr");
        assert_eq!(shell_quote("-0.5"), "-0.5");
        assert_eq!(shell_quote("my file.esr"), "'my file.esr'");
        assert_eq!(shell_quote(""), "''");
    }
}
