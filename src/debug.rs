//! Debug facilities.
use nom::error::{VerboseError, VerboseErrorKind};
use std::{
    fmt::{self, Debug},
    io,
};

use crate::{colouring::ColouringError, graph::GraphError};

// Error types and From<...> implementations

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid graph: {0}")]
    InvalidGraph(GraphError),
    #[error("Invalid colouring: {0}")]
    InvalidColouring(ColouringError),
    /// The engine reported a failure. Its status code is
    /// owned by the engine and is only logged, never returned.
    #[error("Canonical form computation failed")]
    Canonicalization,
    #[error("Could not size buffers for {0} elements")]
    Allocation(usize),
    #[error("Error while parsing input file with graph description")]
    ParseError(Vec<VerboseErrorKind>),
    #[error("Error while reading input")]
    IoError(io::Error),
}

impl From<GraphError> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ge: GraphError) -> Self {
        Self::InvalidGraph(ge)
    }
}

impl From<ColouringError> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ce: ColouringError) -> Self {
        Self::InvalidColouring(ce)
    }
}

impl From<io::Error> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ie: io::Error) -> Self {
        Self::IoError(ie)
    }
}

#[cfg(not(tarpaulin_include))]
fn handle_nom_verbose_error<E: Debug>(verbose: VerboseError<E>) -> Vec<VerboseErrorKind> {
    verbose
        .errors
        .into_iter()
        .map(|(msg, kind)| {
            tracing::debug!(input = ?msg, ?kind, "parse error");
            kind
        })
        .collect()
}

impl<'a> From<nom::Err<VerboseError<&'a str>>> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(pe: nom::Err<VerboseError<&'a str>>) -> Self {
        match pe {
            nom::Err::Error(verbose) | nom::Err::Failure(verbose) => {
                Self::ParseError(handle_nom_verbose_error(verbose))
            }
            nom::Err::Incomplete(_) => Self::ParseError(Vec::new()),
        }
    }
}

/// Empties `buffer` and makes room for `len` elements,
/// reporting a failed allocation instead of aborting.
pub(crate) fn clear_and_reserve<T>(buffer: &mut Vec<T>, len: usize) -> Result<(), Error> {
    buffer.clear();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::Allocation(len))
}

/// A buffer of `len` copies of `value`, reporting a failed
/// allocation instead of aborting.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, Error> {
    let mut buffer = Vec::new();
    clear_and_reserve(&mut buffer, len)?;
    buffer.resize(len, value);
    Ok(buffer)
}

// Custom formatter for debug printing

#[cfg(not(tarpaulin_include))]
pub fn opt_fmt<T: fmt::Debug>(option: &Option<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match option {
        Some(val) => val.fmt(f),
        None => write!(f, "None"),
    }
}

// Debug macros that allow to time single expressions

#[macro_export]
macro_rules! time {
    ($i:ident, $ret:ident, $exp:expr) => {
        let before = std::time::Instant::now();
        let $ret = $exp;
        let $i = before.elapsed();
    };
}
