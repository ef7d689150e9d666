//! Applying canonical labellings to graphs.

use crate::{
    debug::Error,
    graph::{SparseGraph, VertexIndex},
};

/// Whether `labelling` holds every vertex of `0..size` exactly once.
pub fn is_permutation(labelling: &[VertexIndex], size: usize) -> bool {
    if labelling.len() != size {
        return false;
    }

    let mut seen = vec![false; size];
    labelling.iter().all(|&vertex| {
        if vertex < 0 || vertex as usize >= size || seen[vertex as usize] {
            false
        } else {
            seen[vertex as usize] = true;
            true
        }
    })
}

/// Inverse permutation: `invert(lab)[lab[i]] == i`.
pub fn invert(labelling: &[VertexIndex]) -> Result<Vec<VertexIndex>, Error> {
    if !is_permutation(labelling, labelling.len()) {
        return Err(Error::Canonicalization);
    }

    let mut inverse = vec![0; labelling.len()];
    for (position, &vertex) in labelling.iter().enumerate() {
        inverse[vertex as usize] = position as VertexIndex;
    }
    Ok(inverse)
}

/// The graph in which vertex `i` is the vertex `labelling[i]` of `graph`.
/// Neighbour lists of the result are sorted, so two graphs relabelled
/// into the same canonical form compare equal.
pub fn apply_labelling(graph: &SparseGraph, labelling: &[VertexIndex]) -> Result<SparseGraph, Error> {
    if labelling.len() != graph.size() {
        return Err(Error::Canonicalization);
    }

    let inverse = invert(labelling)?;
    let adjacency = labelling
        .iter()
        .map(|&vertex| {
            let mut neighbours = graph
                .neighbours(vertex as usize)
                .iter()
                .map(|&end| inverse[end as usize])
                .collect::<Vec<_>>();
            neighbours.sort_unstable();
            neighbours
        })
        .collect::<Vec<_>>();

    SparseGraph::from_adjacency(&adjacency)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[], 0));
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[2, 0, 0], 3));
        assert!(!is_permutation(&[2, 0, 3], 3));
        assert!(!is_permutation(&[-1, 0, 1], 3));
        assert!(!is_permutation(&[0, 1], 3));
    }

    #[test]
    fn test_invert() {
        assert_eq!(vec![1, 2, 0], invert(&[2, 0, 1]).unwrap());
        assert_eq!(vec![0, 1, 2], invert(&invert(&[0, 1, 2]).unwrap()).unwrap());
        assert!(invert(&[]).unwrap().is_empty());
    }

    #[test]
    fn invert_rejects_non_permutation() {
        assert!(matches!(invert(&[2, 2]), Err(Error::Canonicalization)));
        assert!(matches!(invert(&[0, 5]), Err(Error::Canonicalization)));
        assert!(matches!(invert(&[-1]), Err(Error::Canonicalization)));
    }

    #[test]
    fn relabel_path() {
        // 0 -> 1 -> 2, relabelled so that the path runs 2 -> 1 -> 0.
        let graph = SparseGraph::from_adjacency(&[vec![1], vec![2], vec![]]).unwrap();
        let relabelled = apply_labelling(&graph, &[2, 1, 0]).unwrap();
        assert_eq!(vec![vec![], vec![0], vec![1]], relabelled.to_adjacency());
    }

    #[test]
    fn relabel_sorts_neighbours() {
        let graph = SparseGraph::from_adjacency(&[vec![2, 1], vec![], vec![]]).unwrap();
        let relabelled = apply_labelling(&graph, &[0, 1, 2]).unwrap();
        assert_eq!(vec![vec![1, 2], vec![], vec![]], relabelled.to_adjacency());
    }

    #[test]
    fn relabel_rejects_non_permutation() {
        let graph = SparseGraph::from_adjacency(&[vec![1], vec![0]]).unwrap();
        assert!(matches!(
            apply_labelling(&graph, &[1, 1]),
            Err(Error::Canonicalization)
        ));
    }
}
