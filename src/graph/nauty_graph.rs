use custom_debug_derive::Debug;
use nauty_Traces_sys::SparseGraph as NautySparseGraph;
use std::{convert::TryInto, os::raw::c_int};

use super::{SparseGraph, VertexIndex};
use crate::debug::Error;

/// Flip class boundaries into the nauty convention,
/// where a 0 in ptn ends a cell and 1 continues it.
pub fn to_nauty_partition(partition: &[c_int]) -> Vec<c_int> {
    partition
        .iter()
        .map(|&boundary| if boundary == 1 { 0 } else { 1 })
        .collect()
}

/// Everything sparse nauty reads besides `lab`, in its own layout.
#[derive(Debug)]
pub struct NautyInput {
    /// actual graph
    pub sparse_graph: NautySparseGraph,
    /// ptn aka the colouring
    pub partition: Vec<c_int>,
}

impl NautyInput {
    pub fn new(graph: &SparseGraph, partition: &[c_int]) -> Result<NautyInput, Error> {
        let number_vertices = graph.size();
        let number_edges = graph.number_edges();
        debug_assert_eq!(number_vertices, partition.len());

        let mut nauty_input = NautyInput {
            sparse_graph: NautySparseGraph::new(number_vertices, number_edges),
            partition: to_nauty_partition(partition),
        };

        for (index, (&degree, &offset)) in graph.degrees().iter().zip(graph.offsets()).enumerate() {
            nauty_input.sparse_graph.d[index] = degree
                .try_into()
                .map_err(|_| Error::Allocation(number_edges))?;
            nauty_input.sparse_graph.v[index] = offset
                .try_into()
                .map_err(|_| Error::Allocation(number_edges))?;
        }
        nauty_input.sparse_graph.e.copy_from_slice(graph.edges());

        Ok(nauty_input)
    }
}

/// Reads a graph nauty wrote into `sparse_graph` back. Neighbour
/// lists come out sorted, as nauty does not fix their order.
pub fn from_nauty_graph(sparse_graph: &NautySparseGraph) -> Result<SparseGraph, Error> {
    let adjacency = sparse_graph
        .d
        .iter()
        .zip(sparse_graph.v.iter())
        .map(|(&degree, &offset)| {
            let start = offset as usize;
            let mut neighbours: Vec<VertexIndex> =
                sparse_graph.e[start..start + degree as usize].to_vec();
            neighbours.sort_unstable();
            neighbours
        })
        .collect::<Vec<_>>();

    SparseGraph::from_adjacency(&adjacency)
}
