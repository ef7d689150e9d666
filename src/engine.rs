//! The seam between the bridge and the canonical form engine.

use std::os::raw::c_int;

use crate::{
    debug::Error,
    graph::{SparseGraph, VertexIndex},
};

/// Options handed to the engine for a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Also materialise the canonically labelled graph,
    /// not only the labelling.
    pub compute_canonical_form: bool,
    fixed_partition: bool,
}

impl EngineOptions {
    pub fn new(compute_canonical_form: bool) -> Self {
        EngineOptions {
            compute_canonical_form,
            fixed_partition: true,
        }
    }

    /// The supplied partition has to be respected as is. The engine
    /// must never replace it with a colouring of its own.
    pub fn fixed_partition(&self) -> bool {
        self.fixed_partition
    }
}

/// What the engine reports back besides the labelling it wrote in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReport {
    /// 0 on success, anything else is a failure whose meaning
    /// is defined by the engine.
    pub status: c_int,
    /// Only present if requested and `status` is 0.
    pub canonical_graph: Option<SparseGraph>,
}

impl EngineReport {
    pub fn success(canonical_graph: Option<SparseGraph>) -> Self {
        EngineReport {
            status: 0,
            canonical_graph,
        }
    }

    pub fn failure(status: c_int) -> Self {
        debug_assert_ne!(status, 0);
        EngineReport {
            status,
            canonical_graph: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// An engine computing canonical labellings of coloured graphs.
///
/// `labels` and `partition` hold the ordering and the class boundaries
/// (1 on the last position of a class) of the fixed colouring, both of
/// length n. On success `labels` holds the canonical labelling: position
/// `i` names the vertex of the input graph that becomes vertex `i`.
/// `orbits` is scratch space of length n the engine may use.
///
/// `Err` is reserved for failures of the caller side plumbing (such as
/// buffers that cannot be sized), engine failures go into the status.
pub trait CanonicalFormEngine {
    fn canonical_labelling(
        &self,
        graph: &SparseGraph,
        labels: &mut [VertexIndex],
        partition: &mut [c_int],
        orbits: &mut [VertexIndex],
        options: &EngineOptions,
    ) -> Result<EngineReport, Error>;
}

impl<E: CanonicalFormEngine + ?Sized> CanonicalFormEngine for &E {
    fn canonical_labelling(
        &self,
        graph: &SparseGraph,
        labels: &mut [VertexIndex],
        partition: &mut [c_int],
        orbits: &mut [VertexIndex],
        options: &EngineOptions,
    ) -> Result<EngineReport, Error> {
        (**self).canonical_labelling(graph, labels, partition, orbits, options)
    }
}
