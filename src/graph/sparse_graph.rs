use custom_debug_derive::Debug;

use super::{AdjacencyList, GraphError, VertexIndex};
use crate::debug::{clear_and_reserve, Error};

/// Fixed size graph in compressed form: the neighbour lists of all
/// vertices are concatenated in vertex order, `offsets[v]` points at
/// the first neighbour of `v` and `degrees[v]` counts them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SparseGraph {
    #[debug(skip)]
    offsets: Vec<usize>,
    degrees: Vec<usize>,
    edges: Vec<VertexIndex>,
}

impl SparseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_adjacency(adjacency: &AdjacencyList) -> Result<Self, Error> {
        let mut graph = Self::new();
        graph.rebuild(adjacency)?;
        Ok(graph)
    }

    /// Checks that every neighbour is a vertex of the graph
    /// and returns the total number of arcs.
    pub fn validate(adjacency: &AdjacencyList) -> Result<usize, GraphError> {
        let size = adjacency.len();
        let mut edge_number = 0usize;

        for (vertex, neighbours) in adjacency.iter().enumerate() {
            if let Some(&neighbour) = neighbours
                .iter()
                .find(|&&end| end < 0 || end as usize >= size)
            {
                return Err(GraphError {
                    vertex,
                    neighbour,
                    size,
                });
            }
            edge_number += neighbours.len();
        }

        Ok(edge_number)
    }

    /// Replace the content of this graph with the given adjacency list.
    /// Storage is reused, but nothing of the previous graph survives.
    pub fn rebuild(&mut self, adjacency: &AdjacencyList) -> Result<(), Error> {
        let edge_number = Self::validate(adjacency)?;
        self.fill(adjacency, edge_number)
    }

    /// Same as `rebuild`, but expects an already validated adjacency list.
    pub(crate) fn fill(&mut self, adjacency: &AdjacencyList, edge_number: usize) -> Result<(), Error> {
        let size = adjacency.len();

        clear_and_reserve(&mut self.offsets, size)?;
        clear_and_reserve(&mut self.degrees, size)?;
        clear_and_reserve(&mut self.edges, edge_number)?;

        for neighbours in adjacency {
            self.offsets.push(self.edges.len());
            self.degrees.push(neighbours.len());
            self.edges.extend_from_slice(neighbours);
        }

        debug_assert_eq!(self.edges.len(), edge_number);
        Ok(())
    }

    /// Number of vertices, n.
    pub fn size(&self) -> usize {
        self.degrees.len()
    }

    /// Number of arcs, m.
    pub fn number_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn edges(&self) -> &[VertexIndex] {
        &self.edges
    }

    /// Neighbours of `vertex` in the order of the adjacency list.
    /// Panics if `vertex` is not a vertex of this graph.
    pub fn neighbours(&self, vertex: usize) -> &[VertexIndex] {
        let start = self.offsets[vertex];
        &self.edges[start..start + self.degrees[vertex]]
    }

    pub fn iterate_edges(&self) -> impl Iterator<Item = (VertexIndex, VertexIndex)> + '_ {
        (0..self.size()).flat_map(move |start| {
            self.neighbours(start)
                .iter()
                .map(move |end| (start as VertexIndex, *end))
        })
    }

    pub fn to_adjacency(&self) -> Vec<Vec<VertexIndex>> {
        (0..self.size())
            .map(|vertex| self.neighbours(vertex).to_vec())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn example_adjacency() -> Vec<Vec<VertexIndex>> {
        vec![vec![5], vec![4], vec![7, 6], vec![], vec![3], vec![3], vec![1], vec![0]]
    }

    #[test]
    fn empty_graph() {
        let graph = SparseGraph::from_adjacency(&[]).unwrap();
        assert!(graph.is_empty());
        assert_eq!(0, graph.size());
        assert_eq!(0, graph.number_edges());
    }

    #[test]
    fn correct_sparse_repr() {
        let adjacency = example_adjacency();
        let graph = SparseGraph::from_adjacency(&adjacency).unwrap();

        assert_eq!(8, graph.size());
        assert_eq!(8, graph.number_edges());
        assert_eq!(graph.degrees(), &[1, 1, 2, 0, 1, 1, 1, 1]);
        assert_eq!(graph.offsets(), &[0, 1, 2, 4, 4, 5, 6, 7]);
        assert_eq!(graph.edges(), &[5, 4, 7, 6, 3, 3, 1, 0]);
        // Neighbour order is kept as given.
        assert_eq!(graph.neighbours(2), &[7, 6]);
        assert!(graph.neighbours(3).is_empty());
        assert_eq!(adjacency, graph.to_adjacency());
    }

    #[test]
    fn no_symmetrization() {
        let graph = SparseGraph::from_adjacency(&[vec![1], vec![]]).unwrap();
        let edges = graph.iterate_edges().collect::<Vec<_>>();
        assert_eq!(vec![(0, 1)], edges);
    }

    #[test]
    fn test_out_of_range_neighbours() {
        let too_big = vec![vec![1], vec![2]];
        assert_eq!(
            Err(GraphError {
                vertex: 1,
                neighbour: 2,
                size: 2
            }),
            SparseGraph::validate(&too_big)
        );

        let negative = vec![vec![], vec![0, -1], vec![]];
        assert_eq!(
            Err(GraphError {
                vertex: 1,
                neighbour: -1,
                size: 3
            }),
            SparseGraph::validate(&negative)
        );

        assert!(matches!(
            SparseGraph::from_adjacency(&too_big),
            Err(Error::InvalidGraph(_))
        ));
    }

    #[test]
    fn rebuild_leaves_nothing_behind() {
        let mut graph = SparseGraph::from_adjacency(&example_adjacency()).unwrap();

        let small = vec![vec![1], vec![0]];
        graph.rebuild(&small).unwrap();
        assert_eq!(SparseGraph::from_adjacency(&small).unwrap(), graph);

        // A failed rebuild is caught before touching the storage.
        assert!(graph.rebuild(&[vec![3]]).is_err());
        assert_eq!(small, graph.to_adjacency());
    }
}
