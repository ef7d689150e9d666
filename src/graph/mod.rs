//! Representation of graphs as well as
//! functionalities to build them from
//! adjacency lists or switch to
//! to a representation understood by nauty.
use std::os::raw::c_int;

mod sparse_graph;
pub use sparse_graph::SparseGraph;

#[cfg(feature = "nauty")]
mod nauty_graph;
#[cfg(feature = "nauty")]
pub use nauty_graph::{from_nauty_graph, to_nauty_partition, NautyInput};

pub type Colour = c_int;
pub type VertexIndex = c_int;

/// Adjacency list as handed over by the host: one
/// neighbour list per vertex, 0-based indices.
pub type AdjacencyList = [Vec<VertexIndex>];

/// A neighbour entry that does not name a vertex of the graph.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("vertex {vertex} has neighbour {neighbour} outside of 0..{size}")]
pub struct GraphError {
    pub vertex: usize,
    pub neighbour: VertexIndex,
    pub size: usize,
}
