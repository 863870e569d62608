use std::path::PathBuf;

use tagfile_format::{OpenError, ParseError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot read definition file `{}`", .path.display())]
    ReadDefinition {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid definition file `{}`", .path.display())]
    InvalidDefinition {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Cannot open tagfile `{}`", .path.display())]
    OpenTagfile {
        path: PathBuf,
        #[source]
        source: OpenError,
    },

    #[error("Cannot read tag {tag:#04x}")]
    Read {
        tag: u8,
        #[source]
        source: tagfile_format::Error,
    },

    #[error("Cannot finish reading `{}`", .path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: tagfile_format::Error,
    },
}
