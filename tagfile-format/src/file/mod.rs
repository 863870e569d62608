mod reader;
mod writer;

use std::path::Path;

pub use self::reader::{Item, TagFileReader};
pub use self::writer::TagFileWriter;

use crate::definition::{Definitions, ParseError};
use crate::error::{Error, OpenError, Result};
use crate::navigator::Navigator;
use crate::report::{Mode, Report, Reporter, Severity};

#[inline(always)]
fn read_definitions(path: &Path) -> std::result::Result<Definitions, OpenError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| OpenError::ReadDefinition(e, path.to_path_buf()))?;
    Definitions::parse(&text)
        .map_err(|e: ParseError| OpenError::InvalidDefinition(e, path.to_path_buf()))
}

/// Schema position plus sticky error state of one open tagfile.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) nav: Navigator,
    reporter: Reporter,
}

impl Session {
    fn new(defs: Definitions, mode: Mode) -> Session {
        Session {
            nav: Navigator::new(defs),
            reporter: Reporter::new(mode),
        }
    }

    fn with_paths(mut self, definition: &Path, data: &Path) -> Session {
        self.reporter = self.reporter.with_paths(definition, data);
        self
    }

    /// Refuses to run further operations once an error has been recorded.
    #[inline(always)]
    fn guard(&self) -> Result<()> {
        if self.reporter.has_error() {
            return Err(Error::Poisoned);
        }
        Ok(())
    }

    #[inline(always)]
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|e| self.fail(e))
    }

    fn fail(&mut self, error: Error) -> Error {
        self.record(Severity::Error, &error);
        error
    }

    /// Records a consistency problem without failing the current operation.
    fn warn(&mut self, error: Error) {
        self.record(Severity::Warning, &error);
    }

    fn record(&mut self, severity: Severity, error: &Error) {
        let cursor = self.nav.cursor();
        self.reporter
            .report(severity, error.to_string(), self.nav.defs(), cursor);
    }

    #[inline(always)]
    fn has_error(&self) -> bool {
        self.reporter.has_error()
    }

    #[inline(always)]
    fn last_report(&self) -> Option<&Report> {
        self.reporter.last()
    }

    #[inline(always)]
    fn clear_error(&mut self) {
        self.reporter.clear()
    }
}
