//! Canonical labelling with sparse nauty.

use nauty_Traces_sys::{
    optionblk, sparsenauty, statsblk, SparseGraph as NautySparseGraph, FALSE, TRUE,
};
use std::{os::raw::c_int, sync::Mutex};

use crate::{
    debug::Error,
    engine::{CanonicalFormEngine, EngineOptions, EngineReport},
    graph::{from_nauty_graph, NautyInput, SparseGraph, VertexIndex},
};

/// nauty keeps its work space in static storage,
/// so only one call may be in flight per process.
static NAUTY_LOCK: Mutex<()> = Mutex::new(());

/// Calls sparse nauty in digraph mode with the given colouring
/// as a fixed partition.
#[derive(Debug, Default, Clone, Copy)]
pub struct SparseNauty;

impl CanonicalFormEngine for SparseNauty {
    fn canonical_labelling(
        &self,
        graph: &SparseGraph,
        labels: &mut [VertexIndex],
        partition: &mut [c_int],
        orbits: &mut [VertexIndex],
        options: &EngineOptions,
    ) -> Result<EngineReport, Error> {
        let n = graph.size();
        debug_assert!(labels.len() == n && partition.len() == n && orbits.len() == n);

        // nauty has nothing to do for the empty graph.
        if n == 0 {
            let canonical_graph = if options.compute_canonical_form {
                Some(SparseGraph::new())
            } else {
                None
            };
            return Ok(EngineReport::success(canonical_graph));
        }

        let mut nauty_input = NautyInput::new(graph, partition)?;
        let mut canonical_graph = NautySparseGraph::new(n, graph.number_edges());

        // Plain sparse defaults in digraph mode, without the
        // adjacencies_sg vertex invariant, which the bindings do not
        // export. Labellings are canonical but can differ from the ones
        // DEFAULTOPTIONS_SPARSEDIGRAPH produces.
        let mut nauty_options = optionblk::default_sparse();
        nauty_options.digraph = TRUE;
        nauty_options.getcanon = TRUE;
        if options.fixed_partition() {
            nauty_options.defaultptn = FALSE;
        }
        let mut stats = statsblk::default();

        {
            let _guard = NAUTY_LOCK
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            // Safety: Call to nauty library function. All arrays have
            // length n and the canonical graph has room for all arcs.
            unsafe {
                sparsenauty(
                    &mut (&mut nauty_input.sparse_graph).into(),
                    labels.as_mut_ptr(),
                    nauty_input.partition.as_mut_ptr(),
                    orbits.as_mut_ptr(),
                    &mut nauty_options,
                    &mut stats,
                    &mut (&mut canonical_graph).into(),
                );
            }
        }

        if stats.errstatus != 0 {
            return Ok(EngineReport::failure(stats.errstatus));
        }

        let canonical_graph = if options.compute_canonical_form {
            Some(from_nauty_graph(&canonical_graph)?)
        } else {
            None
        };

        Ok(EngineReport::success(canonical_graph))
    }
}
