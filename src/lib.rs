#![warn(rust_2018_idioms)]

//! Bridge between coloured directed graphs as a host hands them over
//! (adjacency lists and a packed colouring) and a canonical labelling
//! engine such as nauty.
//!
//! Input is validated and transcoded into the sparse representation
//! the engine expects, the engine runs once with the colouring as a
//! fixed partition, and the canonical labelling (optionally together
//! with the canonically labelled graph) is handed back.

pub mod debug;
pub use debug::Error;

pub mod graph;
pub use graph::{AdjacencyList, Colour, GraphError, SparseGraph, VertexIndex};

pub mod colouring;
pub use colouring::{BlockMarker, Colouring, ColouringError};

pub mod engine;
pub use engine::{CanonicalFormEngine, EngineOptions, EngineReport};

#[cfg(feature = "nauty")]
pub mod nauty;
#[cfg(feature = "nauty")]
pub use nauty::SparseNauty;

pub mod relabel;

pub mod statistics;
pub use statistics::{CanonTimings, TimingStatistics};

pub mod misc;
pub use misc::{OutputMode, Settings};

pub mod canon;
pub use canon::{
    release_thread_context, CanonContext, CanonJob, Canonical, Canonicalizer, Outcome, Phase,
};

pub mod parser;

#[cfg(feature = "nauty")]
use std::os::raw::c_int;

/// Computes the canonical labelling of the coloured graph with nauty.
/// `coloring` is a packed colouring in which a negated entry opens a
/// new colour class ([`BlockMarker::Start`]).
///
/// Streams in which a negated entry closes a class instead, such as
/// `[-5, -6, 7, -8, 1, 2, 3, -4]`, are often accepted here as well but
/// decode into different classes. Use
/// `Canonicalizer::with_settings(SparseNauty, Settings { marker: BlockMarker::End, .. })`
/// for those.
#[cfg(feature = "nauty")]
pub fn canonicalize(
    adjacency: &AdjacencyList,
    coloring: &[c_int],
    compute_canonical_form: bool,
) -> Result<Canonical, Error> {
    Canonicalizer::new(SparseNauty).canonicalize(adjacency, coloring, compute_canonical_form)
}

/// Same input as [`canonicalize`], but only reports how long building
/// the engine input and canonicalizing took. Block end framed streams
/// need a [`Canonicalizer`] with `BlockMarker::End`, too.
#[cfg(feature = "nauty")]
pub fn canonicalize_timed(
    adjacency: &AdjacencyList,
    coloring: &[c_int],
) -> Result<CanonTimings, Error> {
    Canonicalizer::new(SparseNauty).canonicalize_timed(adjacency, coloring)
}
