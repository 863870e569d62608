//! Sticky error state shared by reader and writer sessions.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::definition::{Definitions, NodeId, Vr};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    Reading,
    Writing,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Severity {
    /// A consistency check failed but the operation completed.
    Warning,
    Error,
}

/// One level of the group trace: the schema cursor first, then each
/// enclosing group definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub tag: u8,
    pub vr: Vr,
    pub vm: u32,
    pub has_default: bool,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub(crate) severity: Severity,
    pub(crate) message: String,
    pub(crate) trace: Vec<TraceFrame>,
    pub(crate) mode: Mode,
    pub(crate) definition: Option<PathBuf>,
    pub(crate) data: Option<PathBuf>,
}

impl Report {
    #[inline(always)]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline(always)]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline(always)]
    pub fn trace(&self) -> &[TraceFrame] {
        &self.trace
    }

    #[inline(always)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn definition_path(&self) -> Option<&Path> {
        self.definition.as_deref()
    }

    pub fn data_path(&self) -> Option<&Path> {
        self.data.as_deref()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if !self.trace.is_empty() {
            write!(f, "\nGroup trace:")?;
            for (level, frame) in self.trace.iter().enumerate() {
                write!(
                    f,
                    "\n  #{}: {:#04x} {} {:5} default:{}",
                    level, frame.tag, frame.vr, frame.vm, frame.has_default
                )?;
            }
        }

        if let (Some(definition), Some(data)) = (&self.definition, &self.data) {
            let action = match self.mode {
                Mode::Reading => "reading",
                Mode::Writing => "writing",
            };
            write!(
                f,
                "\nWhile {} '{}' using definition file '{}'",
                action,
                data.display(),
                definition.display()
            )?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct Reporter {
    mode: Mode,
    definition: Option<PathBuf>,
    data: Option<PathBuf>,
    last: Option<Report>,
}

impl Reporter {
    pub(crate) fn new(mode: Mode) -> Reporter {
        Reporter {
            mode,
            definition: None,
            data: None,
            last: None,
        }
    }

    pub(crate) fn with_paths(mut self, definition: &Path, data: &Path) -> Reporter {
        self.definition = Some(definition.to_path_buf());
        self.data = Some(data.to_path_buf());
        self
    }

    #[inline(always)]
    pub(crate) fn has_error(&self) -> bool {
        self.last.is_some()
    }

    #[inline(always)]
    pub(crate) fn last(&self) -> Option<&Report> {
        self.last.as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.last = None;
    }

    /// Records `message` along with the ancestry of the schema cursor and
    /// sets the sticky flag.
    pub(crate) fn report(
        &mut self,
        severity: Severity,
        message: String,
        defs: &Definitions,
        cursor: Option<NodeId>,
    ) {
        let trace = match cursor {
            Some(cursor) => defs
                .ancestry(cursor)
                .map(|(_, def)| TraceFrame {
                    tag: def.tag(),
                    vr: def.vr(),
                    vm: def.multiplicity(),
                    has_default: def.default().is_some(),
                })
                .collect(),
            None => Vec::new(),
        };

        let report = Report {
            severity,
            message,
            trace,
            mode: self.mode,
            definition: self.definition.clone(),
            data: self.data.clone(),
        };

        match severity {
            Severity::Warning => tracing::warn!("{}", report),
            Severity::Error => tracing::error!("{}", report),
        }

        self.last = Some(report);
    }
}
