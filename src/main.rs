#![warn(rust_2018_idioms)]

//! Computes canonical labellings of coloured directed graphs
//! given in dreadnaut syntax with nauty.

use clap::Parser;
use std::{fs, path::PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use canon_bridge::{
    parser::parse_dreadnaut_input, BlockMarker, CanonContext, Canonical, Canonicalizer, Error,
    OutputMode, Settings, SparseGraph, SparseNauty, TimingStatistics,
};

#[derive(Parser, Debug)]
#[command(
    name = "canon-bridge",
    version,
    about = "Canonical labelling of coloured directed graphs"
)]
struct Cli {
    /// Graph file in dreadnaut syntax
    input: PathBuf,
    /// Print the canonically labelled graph as well
    #[arg(long)]
    canonical_graph: bool,
    /// Only measure how long building and canonicalizing take
    #[arg(long)]
    timed: bool,
    /// Number of measured runs in timed mode
    #[arg(long, default_value_t = 1)]
    repeat: usize,
    /// Hand the colouring over with negated entries closing
    /// colour classes instead of opening them
    #[arg(long)]
    block_end: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            marker: if self.block_end {
                BlockMarker::End
            } else {
                BlockMarker::Start
            },
            compute_canonical_form: self.canonical_graph,
            output: if self.timed {
                OutputMode::Timing
            } else {
                OutputMode::Labelling
            },
        }
    }
}

#[cfg(not(tarpaulin_include))]
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Prints a graph in the same syntax it is read in.
#[cfg(not(tarpaulin_include))]
fn print_graph(graph: &SparseGraph) {
    println!("n={} g", graph.size());
    for vertex in 0..graph.size() {
        let arcs = graph
            .neighbours(vertex)
            .iter()
            .map(|end| end.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let line_end = if vertex + 1 == graph.size() { "." } else { ";" };
        println!("{}:{}{}", vertex, arcs, line_end);
    }
}

#[cfg(not(tarpaulin_include))]
fn print_canonical(canonical: &Canonical) {
    let labelling = canonical
        .labelling
        .iter()
        .map(|vertex| vertex.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", labelling);

    if let Some(graph) = &canonical.canonical_graph {
        print_graph(graph);
    }
}

#[cfg(not(tarpaulin_include))]
fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing();

    let settings = cli.settings();
    tracing::debug!(?settings, input = ?cli.input, "starting");

    let content = fs::read_to_string(&cli.input)?;
    let parsed = parse_dreadnaut_input(&content)?;
    let packed = parsed.colouring.encode(settings.marker);
    tracing::info!(
        n = parsed.adjacency.len(),
        classes = parsed.colouring.number_classes(),
        "read graph"
    );

    let canonicalizer = Canonicalizer::with_settings(SparseNauty, settings);
    let mut context = CanonContext::new();

    match settings.output {
        OutputMode::Labelling => {
            let canonical = canonicalizer.canonicalize_in(
                &mut context,
                parsed.adjacency(),
                &packed,
                settings.compute_canonical_form,
            )?;
            print_canonical(&canonical);
        }
        OutputMode::Timing => {
            let mut statistics = TimingStatistics::default();
            for _ in 0..cli.repeat.max(1) {
                let run = canonicalizer.canonicalize_timed_in(
                    &mut context,
                    parsed.adjacency(),
                    &packed,
                );
                if let Ok(timings) = &run {
                    println!("{}", timings);
                }
                statistics.log_run(&run);
            }
            println!("{}", statistics);

            if statistics.failures == statistics.runs {
                return Err(Error::Canonicalization);
            }
        }
    }

    Ok(())
}
