//! Parser for coloured graphs in a dreadnaut like syntax:
//!
//! ```text
//! n=4 g
//! 0:1 2 ;
//! 2:3;
//! 3:0.
//! f=[0|1, 2]
//! ```
//!
//! Vertices without an arc line have no outgoing arcs. Vertices
//! missing from `f=[...]` form one last colour class.

use crate::{
    colouring::Colouring,
    debug::try_filled,
    graph::{AdjacencyList, VertexIndex},
    Error,
};

pub type Input<'a> = &'a str;
pub type ParseError<'a> = nom::error::VerboseError<Input<'a>>;
pub type ParseResult<'a, O> = nom::IResult<Input<'a>, O, ParseError<'a>>;

/// A graph read from a file, together with its colouring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub adjacency: Vec<Vec<VertexIndex>>,
    pub colouring: Colouring,
}

impl ParsedInput {
    pub fn adjacency(&self) -> &AdjacencyList {
        &self.adjacency
    }
}

/// Parse the line that contains the size, e.g. `n=12 g`.
fn parse_graph_size(input: Input<'_>) -> ParseResult<'_, usize> {
    use nom::{
        bytes::complete::tag,
        character::complete::{digit1, multispace0, space0},
        combinator::{map_res, opt},
        error::context,
        sequence::tuple,
    };

    let mut size_header = context(
        "Graph size header",
        tuple((
            multispace0,
            tag("n="),
            map_res(digit1, |size: &str| size.parse::<usize>()),
            space0,
            opt(tag("g")),
            multispace0,
        )),
    );
    let (rest, (_, _, graph_size, _, _, _)) = size_header(input)?;
    Ok((rest, graph_size))
}

/// Parse a single vertex index.
fn parse_vertex_index(input: Input<'_>) -> ParseResult<'_, VertexIndex> {
    use nom::{character::complete::digit1, combinator::map_res};
    map_res(digit1, |index: &str| index.parse::<VertexIndex>())(input)
}

/// Parse the arcs from vertex s from `s:e1 e2 ... en` and the line end,
/// which determines if more arc lines follow (`;`) or not (`.`).
fn parse_arc_line(
    graph_size: usize,
    input: Input<'_>,
) -> ParseResult<'_, (VertexIndex, Vec<VertexIndex>, bool)> {
    use nom::{
        branch::alt,
        bytes::complete::tag,
        character::complete::{multispace0, space0, space1},
        combinator::verify,
        error::context,
        multi::separated_list0,
        sequence::{delimited, tuple},
    };

    let (input, vertex) = context(
        "line starts with a vertex of the graph",
        verify(parse_vertex_index, |vertex: &VertexIndex| {
            (*vertex as usize) < graph_size
        }),
    )(input)?;
    let (input, _) = tuple((space0, tag(":"), space0))(input)?;

    let (input, arcs) = context(
        "List of arcs from this vertex",
        separated_list0(space1, parse_vertex_index),
    )(input)?;

    let (rest, end) = context(
        "Arc line ends with ; or .",
        delimited(space0, alt((tag(";"), tag("."))), multispace0),
    )(input)?;

    Ok((rest, (vertex, arcs, end == ";")))
}

/// Parse the colour classes: `f=[c11,c12,...,c1n|c21,...,c2m|...]`.
fn parse_colour_classes(input: Input<'_>) -> ParseResult<'_, Vec<Vec<VertexIndex>>> {
    use nom::{
        bytes::complete::tag,
        character::complete::space0,
        error::context,
        multi::{separated_list0, separated_list1},
        sequence::{delimited, tuple},
    };

    let sep = |sep_tag| tuple((space0, tag(sep_tag), space0));

    let single_class = separated_list1(sep(","), parse_vertex_index);
    let class_list = separated_list0(sep("|"), single_class);

    context(
        "Colour classes",
        delimited(
            tuple((tag("f=["), space0)),
            class_list,
            tuple((space0, tag("]"))),
        ),
    )(input)
}

/// Only whitespace may follow the colouring.
fn parse_end(input: Input<'_>) -> ParseResult<'_, ()> {
    use nom::{character::complete::multispace0, combinator::all_consuming, error::context};

    let (rest, _) = context("End of input", all_consuming(multispace0))(input)?;
    Ok((rest, ()))
}

pub fn parse_dreadnaut_input(input: Input<'_>) -> Result<ParsedInput, Error> {
    use nom::{character::complete::multispace0, combinator::opt, sequence::terminated};

    let (mut input, graph_size) = parse_graph_size(input)?;
    if graph_size > VertexIndex::MAX as usize {
        return Err(Error::Allocation(graph_size));
    }

    let mut adjacency = try_filled(graph_size, Vec::new())?;
    let mut should_continue = graph_size > 0;
    while should_continue && input.starts_with(|c: char| c.is_ascii_digit()) {
        let (rest, (vertex, arcs, more)) = parse_arc_line(graph_size, input)?;
        adjacency[vertex as usize].extend(arcs);
        should_continue = more;
        input = rest;
    }

    let (input, classes) = opt(terminated(parse_colour_classes, multispace0))(input)?;
    parse_end(input)?;

    let mut classes = classes.unwrap_or_default();
    let mut listed = try_filled(graph_size, false)?;
    for vertex in classes.iter().flatten() {
        if let Some(listed) = listed.get_mut(*vertex as usize) {
            *listed = true;
        }
    }
    let unlisted = (0..graph_size as VertexIndex)
        .filter(|&vertex| !listed[vertex as usize])
        .collect::<Vec<_>>();
    if !unlisted.is_empty() {
        classes.push(unlisted);
    }

    Ok(ParsedInput {
        adjacency,
        colouring: Colouring::new(classes, graph_size)?,
    })
}
