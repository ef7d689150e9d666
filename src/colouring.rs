//! Colourings of a graph, i.e. ordered partitions of its
//! vertices into colour classes, and the packed integer
//! stream the host uses to transport them.
//!
//! A packed stream holds every vertex exactly once, stored one
//! higher than its index (so that vertex 0 can carry a sign).
//! A negated entry marks a class boundary, see [`BlockMarker`].
//! nauty wants the same information as a `lab`/`ptn` pair, which
//! is produced by [`Colouring::flatten_into`].

use itertools::Itertools;
use std::os::raw::c_int;

use crate::{
    debug::{clear_and_reserve, try_filled, Error},
    graph::{Colour, VertexIndex},
};

/// Where a negated entry sits in its colour class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMarker {
    /// The first entry of every class is negated.
    /// The stream therefore has to start with a negative entry.
    Start,
    /// The last entry of every class is negated. The final
    /// class is closed implicitly by the end of the stream.
    End,
}

impl Default for BlockMarker {
    fn default() -> Self {
        Self::Start
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum ColouringError {
    #[error("expected {expected} entries, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("entry {value} at position {position} does not name a vertex")]
    VertexOutOfRange { position: usize, value: c_int },
    #[error("vertex {vertex} appears more than once")]
    DuplicateVertex { vertex: VertexIndex },
    #[error("vertex {vertex} is not coloured")]
    MissingVertex { vertex: VertexIndex },
    #[error("the first entry does not open a colour class")]
    MissingBlockStart,
    #[error("colour class {0} is empty")]
    EmptyClass(usize),
    #[error("partition entry {value} at position {position} is neither 0 nor 1")]
    InvalidBoundary { position: usize, value: c_int },
    #[error("the last colour class is not closed")]
    UnclosedClass,
}

/// Ordered list of colour classes. Stored flat: `order` lists all
/// vertices class by class and `ends[i]` is the exclusive end of
/// class `i` in `order`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Colouring {
    order: Vec<VertexIndex>,
    ends: Vec<usize>,
}

/// Marks `vertex` as seen. `value` is what the caller got as input
/// and is only used to report errors.
fn claim(
    seen: &mut [bool],
    position: usize,
    value: c_int,
    vertex: i64,
) -> Result<VertexIndex, ColouringError> {
    if vertex < 0 || vertex as usize >= seen.len() {
        return Err(ColouringError::VertexOutOfRange { position, value });
    }

    let vertex = vertex as usize;
    if seen[vertex] {
        return Err(ColouringError::DuplicateVertex {
            vertex: vertex as VertexIndex,
        });
    }
    seen[vertex] = true;

    Ok(vertex as VertexIndex)
}

fn check_size(size: usize) -> Result<(), Error> {
    if size > VertexIndex::MAX as usize {
        Err(Error::Allocation(size))
    } else {
        Ok(())
    }
}

impl Colouring {
    /// All `size` vertices in a single class, in index order.
    pub fn uniform(size: usize) -> Result<Self, Error> {
        check_size(size)?;
        let ends = if size == 0 { Vec::new() } else { vec![size] };
        Ok(Colouring {
            order: (0..size as VertexIndex).collect(),
            ends,
        })
    }

    /// Builds a colouring of `size` vertices from explicit classes.
    pub fn new(classes: Vec<Vec<VertexIndex>>, size: usize) -> Result<Self, Error> {
        check_size(size)?;
        let mut seen = try_filled(size, false)?;
        let mut colouring = Colouring {
            order: Vec::new(),
            ends: Vec::with_capacity(classes.len()),
        };
        clear_and_reserve(&mut colouring.order, size)?;

        for (class_index, class) in classes.into_iter().enumerate() {
            if class.is_empty() {
                return Err(ColouringError::EmptyClass(class_index).into());
            }
            for vertex in class {
                let position = colouring.order.len();
                colouring
                    .order
                    .push(claim(&mut seen, position, vertex, vertex as i64)?);
            }
            colouring.ends.push(colouring.order.len());
        }

        if let Some(missing) = seen.iter().position(|seen| !seen) {
            return Err(ColouringError::MissingVertex {
                vertex: missing as VertexIndex,
            }
            .into());
        }

        Ok(colouring)
    }

    /// Groups vertices by their colour. Classes are ordered by
    /// ascending colour, vertices within a class by ascending index.
    pub fn from_colours(colours: &[Colour]) -> Result<Self, Error> {
        let size = colours.len();
        check_size(size)?;

        let order = (0..size as VertexIndex)
            .sorted_by_key(|&vertex| colours[vertex as usize])
            .collect::<Vec<_>>();
        let ends = (1..=size)
            .filter(|&end| {
                end == size || colours[order[end] as usize] != colours[order[end - 1] as usize]
            })
            .collect();

        Ok(Colouring { order, ends })
    }

    /// Decodes a packed stream of a colouring of `size` vertices.
    pub fn decode(packed: &[c_int], size: usize, marker: BlockMarker) -> Result<Self, Error> {
        let mut colouring = Colouring::default();
        colouring.decode_into(packed, size, marker)?;
        Ok(colouring)
    }

    /// Same as `decode`, but reuses the storage of `self`. On success
    /// nothing of the previous content is left.
    pub fn decode_into(
        &mut self,
        packed: &[c_int],
        size: usize,
        marker: BlockMarker,
    ) -> Result<(), Error> {
        check_size(size)?;
        if packed.len() != size {
            return Err(ColouringError::LengthMismatch {
                expected: size,
                found: packed.len(),
            }
            .into());
        }
        if marker == BlockMarker::Start && packed.first().map_or(false, |&first| first >= 0) {
            return Err(ColouringError::MissingBlockStart.into());
        }

        clear_and_reserve(&mut self.order, size)?;
        self.ends.clear();
        let mut seen = try_filled(size, false)?;

        for (position, &value) in packed.iter().enumerate() {
            let vertex = value.unsigned_abs() as i64 - 1;
            let vertex = claim(&mut seen, position, value, vertex)?;

            match marker {
                BlockMarker::Start if value < 0 && position > 0 => self.ends.push(position),
                BlockMarker::End if value < 0 => self.ends.push(position + 1),
                _ => (),
            }
            self.order.push(vertex);
        }

        if size > 0 && self.ends.last() != Some(&size) {
            self.ends.push(size);
        }

        Ok(())
    }

    /// Inverse of `decode`.
    pub fn encode(&self, marker: BlockMarker) -> Vec<c_int> {
        let mut packed = Vec::with_capacity(self.size());

        for class in self.classes() {
            let last = class.len() - 1;
            for (index, vertex) in class.iter().enumerate() {
                let value = *vertex + 1;
                let negate = match marker {
                    BlockMarker::Start => index == 0,
                    BlockMarker::End => index == last,
                };
                packed.push(if negate { -value } else { value });
            }
        }

        packed
    }

    /// Writes the ordering (`lab`) and the class boundaries (`ptn`,
    /// 1 on the last position of every class, 0 elsewhere). Both
    /// buffers are overwritten and end up with exactly `size` entries.
    pub fn flatten_into(
        &self,
        labels: &mut Vec<VertexIndex>,
        partition: &mut Vec<c_int>,
    ) -> Result<(), Error> {
        clear_and_reserve(labels, self.size())?;
        clear_and_reserve(partition, self.size())?;

        labels.extend_from_slice(&self.order);
        partition.resize(self.size(), 0);
        for end in self.ends.iter() {
            partition[end - 1] = 1;
        }

        Ok(())
    }

    /// Inverse of `flatten_into`.
    pub fn from_flat(labels: &[VertexIndex], partition: &[c_int]) -> Result<Self, Error> {
        let size = labels.len();
        check_size(size)?;
        if partition.len() != size {
            return Err(ColouringError::LengthMismatch {
                expected: size,
                found: partition.len(),
            }
            .into());
        }

        let mut seen = try_filled(size, false)?;
        let mut colouring = Colouring::default();
        clear_and_reserve(&mut colouring.order, size)?;

        for (position, (&vertex, &boundary)) in labels.iter().zip(partition).enumerate() {
            colouring
                .order
                .push(claim(&mut seen, position, vertex, vertex as i64)?);
            match boundary {
                0 => (),
                1 => colouring.ends.push(position + 1),
                value => return Err(ColouringError::InvalidBoundary { position, value }.into()),
            }
        }

        if size > 0 && colouring.ends.last() != Some(&size) {
            return Err(ColouringError::UnclosedClass.into());
        }

        Ok(colouring)
    }

    /// Number of coloured vertices.
    pub fn size(&self) -> usize {
        self.order.len()
    }

    pub fn number_classes(&self) -> usize {
        self.ends.len()
    }

    /// All vertices, class by class.
    pub fn order(&self) -> &[VertexIndex] {
        &self.order
    }

    pub fn classes(&self) -> impl Iterator<Item = &[VertexIndex]> + '_ {
        let starts = std::iter::once(0).chain(self.ends.iter().copied());
        starts
            .zip(self.ends.iter())
            .map(move |(start, &end)| &self.order[start..end])
    }
}
