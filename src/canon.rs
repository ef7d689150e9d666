//! Drives a canonical form engine with host input: validates and
//! transcodes the adjacency list and the packed colouring, calls
//! the engine once and extracts what the caller asked for.
//!
//! An invocation runs through the phases
//! `Validating -> Building -> Invoking -> Extracting -> Done`
//! and ends in `Failed` as soon as anything goes wrong. Invalid
//! input never reaches the engine.

use custom_debug_derive::Debug;
use rayon::prelude::*;
use std::{cell::RefCell, os::raw::c_int};

use crate::{
    colouring::{BlockMarker, Colouring},
    debug::{clear_and_reserve, opt_fmt, Error},
    engine::{CanonicalFormEngine, EngineOptions},
    graph::{AdjacencyList, SparseGraph, VertexIndex},
    misc::{OutputMode, Settings},
    relabel::{apply_labelling, is_permutation},
    statistics::CanonTimings,
    time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Building,
    Invoking,
    Extracting,
    Done,
    Failed,
}

/// Result of a successful canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// Position `i` names the input vertex that becomes vertex `i`
    /// of the canonical form.
    pub labelling: Vec<VertexIndex>,
    /// Only present if it was asked for.
    #[debug(with = "opt_fmt")]
    pub canonical_graph: Option<SparseGraph>,
}

/// What a single invocation hands back, depending on `Settings::output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Labelling(Canonical),
    Timing(CanonTimings),
}

/// One graph with its packed colouring, as used for batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonJob {
    pub adjacency: Vec<Vec<VertexIndex>>,
    pub colouring: Vec<c_int>,
}

/// Scratch storage of one invocation. Reusing a context across calls
/// only saves allocations: every call overwrites all buffers and sizes
/// them to the current number of vertices.
#[derive(Debug, Default)]
pub struct CanonContext {
    graph: SparseGraph,
    #[debug(skip)]
    colouring: Colouring,
    /// lab
    labels: Vec<VertexIndex>,
    /// ptn aka the colouring
    partition: Vec<c_int>,
    #[debug(skip)]
    orbits: Vec<VertexIndex>,
}

thread_local! {
    static THREAD_CONTEXT: RefCell<CanonContext> = RefCell::new(CanonContext::new());
}

/// Runs `f` with the context of the current thread. If that context is
/// already in use further up the stack, `f` gets a fresh one instead.
fn with_thread_context<R>(f: impl FnOnce(&mut CanonContext) -> R) -> R {
    THREAD_CONTEXT.with(|context| match context.try_borrow_mut() {
        Ok(mut context) => f(&mut context),
        Err(_) => f(&mut CanonContext::new()),
    })
}

/// Frees the buffers the current thread keeps between calls.
pub fn release_thread_context() {
    with_thread_context(|context| *context = CanonContext::new());
}

impl CanonContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices of the last loaded input.
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Validates the input and fills all buffers from it.
    fn load(
        &mut self,
        adjacency: &AdjacencyList,
        packed: &[c_int],
        marker: BlockMarker,
    ) -> Result<(), Error> {
        let n = adjacency.len();
        tracing::trace!(phase = ?Phase::Validating, n);

        if n > VertexIndex::MAX as usize {
            return Err(Error::Allocation(n));
        }
        let edge_number = SparseGraph::validate(adjacency)?;
        self.colouring.decode_into(packed, n, marker)?;

        tracing::trace!(phase = ?Phase::Building, n, m = edge_number);
        self.graph.fill(adjacency, edge_number)?;
        self.colouring
            .flatten_into(&mut self.labels, &mut self.partition)?;
        clear_and_reserve(&mut self.orbits, n)?;
        self.orbits.resize(n, 0);

        Ok(())
    }

    fn discard(&mut self) {
        self.labels.clear();
        self.partition.clear();
    }
}

/// Bridge between host input and a [`CanonicalFormEngine`].
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer<E> {
    engine: E,
    settings: Settings,
}

impl<E: CanonicalFormEngine> Canonicalizer<E> {
    pub fn new(engine: E) -> Self {
        Self::with_settings(engine, Settings::default())
    }

    pub fn with_settings(engine: E, settings: Settings) -> Self {
        Canonicalizer { engine, settings }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Computes the canonical labelling of the coloured graph, using
    /// the buffers of the calling thread.
    pub fn canonicalize(
        &self,
        adjacency: &AdjacencyList,
        colouring: &[c_int],
        compute_canonical_form: bool,
    ) -> Result<Canonical, Error> {
        with_thread_context(|context| {
            self.canonicalize_in(context, adjacency, colouring, compute_canonical_form)
        })
    }

    /// Same as `canonicalize`, but with caller owned buffers.
    pub fn canonicalize_in(
        &self,
        context: &mut CanonContext,
        adjacency: &AdjacencyList,
        colouring: &[c_int],
        compute_canonical_form: bool,
    ) -> Result<Canonical, Error> {
        let options = EngineOptions::new(compute_canonical_form);
        let (canonical_graph, _) = self.invoke(context, adjacency, colouring, &options)?;

        Ok(Canonical {
            labelling: context.labels.clone(),
            canonical_graph,
        })
    }

    /// Measures building and canonicalizing instead of
    /// returning the labelling.
    pub fn canonicalize_timed(
        &self,
        adjacency: &AdjacencyList,
        colouring: &[c_int],
    ) -> Result<CanonTimings, Error> {
        with_thread_context(|context| self.canonicalize_timed_in(context, adjacency, colouring))
    }

    pub fn canonicalize_timed_in(
        &self,
        context: &mut CanonContext,
        adjacency: &AdjacencyList,
        colouring: &[c_int],
    ) -> Result<CanonTimings, Error> {
        let options = EngineOptions::new(false);
        let (_, timings) = self.invoke(context, adjacency, colouring, &options)?;
        Ok(timings)
    }

    /// Runs one invocation in the output mode of the settings.
    pub fn run_in(
        &self,
        context: &mut CanonContext,
        adjacency: &AdjacencyList,
        colouring: &[c_int],
    ) -> Result<Outcome, Error> {
        match self.settings.output {
            OutputMode::Labelling => self
                .canonicalize_in(
                    context,
                    adjacency,
                    colouring,
                    self.settings.compute_canonical_form,
                )
                .map(Outcome::Labelling),
            OutputMode::Timing => self
                .canonicalize_timed_in(context, adjacency, colouring)
                .map(Outcome::Timing),
        }
    }

    /// Runs independent invocations in parallel, one context per worker.
    /// Results are in the order of `jobs`.
    pub fn canonicalize_batch(&self, jobs: &[CanonJob]) -> Vec<Result<Outcome, Error>>
    where
        E: Sync,
    {
        jobs.par_iter()
            .map_init(CanonContext::new, |context, job| {
                self.run_in(context, &job.adjacency, &job.colouring)
            })
            .collect()
    }

    fn invoke(
        &self,
        context: &mut CanonContext,
        adjacency: &AdjacencyList,
        colouring: &[c_int],
        options: &EngineOptions,
    ) -> Result<(Option<SparseGraph>, CanonTimings), Error> {
        let result = self.try_invoke(context, adjacency, colouring, options);

        match &result {
            Ok((_, timings)) => {
                tracing::debug!(phase = ?Phase::Done, n = context.size(), ?timings);
            }
            Err(error) => {
                context.discard();
                tracing::warn!(phase = ?Phase::Failed, %error, "canonicalization failed");
            }
        }

        result
    }

    fn try_invoke(
        &self,
        context: &mut CanonContext,
        adjacency: &AdjacencyList,
        colouring: &[c_int],
        options: &EngineOptions,
    ) -> Result<(Option<SparseGraph>, CanonTimings), Error> {
        time!(
            build,
            loaded,
            context.load(adjacency, colouring, self.settings.marker)
        );
        loaded?;

        let n = context.size();
        tracing::trace!(phase = ?Phase::Invoking, n, m = context.graph.number_edges());
        time!(
            canonicalize,
            report,
            self.engine.canonical_labelling(
                &context.graph,
                &mut context.labels,
                &mut context.partition,
                &mut context.orbits,
                options,
            )
        );
        let report = report?;

        tracing::trace!(phase = ?Phase::Extracting, status = report.status);
        if !report.is_success() {
            tracing::warn!(status = report.status, "engine reported a failure");
            return Err(Error::Canonicalization);
        }
        if !is_permutation(&context.labels, n) {
            tracing::warn!("engine returned a labelling that is not a permutation");
            return Err(Error::Canonicalization);
        }

        let canonical_graph = if options.compute_canonical_form {
            match report.canonical_graph {
                Some(graph) if graph.size() == n => Some(graph),
                Some(graph) => {
                    tracing::warn!(
                        n,
                        size = graph.size(),
                        "engine returned a canonical graph of the wrong size"
                    );
                    return Err(Error::Canonicalization);
                }
                None => Some(apply_labelling(&context.graph, &context.labels)?),
            }
        } else {
            None
        };

        Ok((
            canonical_graph,
            CanonTimings {
                build,
                canonicalize,
            },
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::{
        doubles::{Behaviour, BruteForceEngine, CountingEngine},
        EngineReport,
    };
    use proptest::prelude::*;

    fn cube() -> Vec<Vec<VertexIndex>> {
        vec![
            vec![1, 3, 4],
            vec![0, 2, 5],
            vec![1, 3, 6],
            vec![0, 2, 7],
            vec![0, 5, 7],
            vec![1, 4, 6],
            vec![2, 5, 7],
            vec![3, 4, 6],
        ]
    }

    /// Vertex `permutation[v]` of the result is vertex `v` of `adjacency`.
    fn permute(adjacency: &[Vec<VertexIndex>], permutation: &[VertexIndex]) -> Vec<Vec<VertexIndex>> {
        let mut permuted = vec![Vec::new(); adjacency.len()];
        for (vertex, neighbours) in adjacency.iter().enumerate() {
            permuted[permutation[vertex] as usize] = neighbours
                .iter()
                .map(|&end| permutation[end as usize])
                .collect();
        }
        permuted
    }

    fn permute_packed(packed: &[c_int], permutation: &[VertexIndex]) -> Vec<c_int> {
        packed
            .iter()
            .map(|&value| {
                let vertex = permutation[value.unsigned_abs() as usize - 1] + 1;
                if value < 0 {
                    -vertex
                } else {
                    vertex
                }
            })
            .collect()
    }

    #[test]
    fn empty_graph() {
        let canonicalizer = Canonicalizer::new(CountingEngine::new());
        let canonical = canonicalizer.canonicalize(&[], &[], true).unwrap();
        assert!(canonical.labelling.is_empty());
        assert_eq!(Some(SparseGraph::new()), canonical.canonical_graph);
    }

    #[test]
    fn single_vertex() {
        let canonicalizer = Canonicalizer::new(BruteForceEngine);
        let canonical = canonicalizer.canonicalize(&[vec![]], &[-1], false).unwrap();
        assert_eq!(vec![0], canonical.labelling);
        assert_eq!(None, canonical.canonical_graph);
    }

    #[test]
    fn single_edge_in_singleton_classes() {
        let adjacency = vec![vec![1], vec![0]];

        let canonicalizer = Canonicalizer::new(BruteForceEngine);
        let canonical = canonicalizer.canonicalize(&adjacency, &[-1, -2], false).unwrap();
        assert_eq!(vec![0, 1], canonical.labelling);

        let settings = Settings {
            marker: BlockMarker::End,
            ..Settings::default()
        };
        let canonicalizer = Canonicalizer::with_settings(BruteForceEngine, settings);
        let canonical = canonicalizer.canonicalize(&adjacency, &[-1, 2], false).unwrap();
        assert_eq!(vec![0, 1], canonical.labelling);
    }

    #[test]
    fn engine_sees_decoded_colouring() {
        let canonicalizer = Canonicalizer::new(CountingEngine::new());
        let mut context = CanonContext::new();
        canonicalizer
            .canonicalize_in(&mut context, &[vec![1], vec![0]], &[-1, -2], false)
            .unwrap();
        assert_eq!(vec![0, 1], context.labels);
        assert_eq!(vec![1, 1], context.partition);
    }

    #[test]
    fn malformed_colouring_never_reaches_engine() {
        let canonicalizer = Canonicalizer::new(CountingEngine::new());
        let adjacency = vec![vec![1], vec![2], vec![0]];

        for packed in [vec![-1, 1, 3], vec![-1, 2], vec![1, -2, 3], vec![-1, 2, 4]].iter() {
            let result = canonicalizer.canonicalize(&adjacency, packed, false);
            assert!(matches!(result, Err(Error::InvalidColouring(_))));
        }
        assert_eq!(0, canonicalizer.engine().calls());
    }

    #[test]
    fn malformed_graph_never_reaches_engine() {
        let canonicalizer = Canonicalizer::new(CountingEngine::new());
        let result = canonicalizer.canonicalize(&[vec![1], vec![2]], &[-1, 2], false);
        assert!(matches!(result, Err(Error::InvalidGraph(_))));

        let result = canonicalizer.canonicalize_timed(&[vec![-1], vec![]], &[-1, 2]);
        assert!(matches!(result, Err(Error::InvalidGraph(_))));
        assert_eq!(0, canonicalizer.engine().calls());
    }

    #[test]
    fn engine_failure_leaks_no_labelling() {
        let canonicalizer =
            Canonicalizer::new(CountingEngine::with_behaviour(Behaviour::Fail(2)));
        let mut context = CanonContext::new();

        let result = canonicalizer.canonicalize_in(&mut context, &cube(), &[-1, 2, 3, 4, 5, 6, 7, 8], true);
        assert!(matches!(result, Err(Error::Canonicalization)));
        assert_eq!(1, canonicalizer.engine().calls());
        assert!(context.labels.is_empty());

        let timed = canonicalizer.canonicalize_timed(&cube(), &[-1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(matches!(timed, Err(Error::Canonicalization)));
    }

    #[test]
    fn non_permutation_is_a_failure() {
        let canonicalizer = Canonicalizer::new(CountingEngine::with_behaviour(Behaviour::Garble));
        let result = canonicalizer.canonicalize(&cube(), &[-1, 2, 3, 4, 5, 6, 7, 8], false);
        assert!(matches!(result, Err(Error::Canonicalization)));
    }

    #[test]
    fn canonical_graph_only_on_request() {
        let canonicalizer = Canonicalizer::new(CountingEngine::new());
        let packed = [-2, 1, 3];
        let adjacency = vec![vec![1], vec![2], vec![]];

        let without = canonicalizer.canonicalize(&adjacency, &packed, false).unwrap();
        assert_eq!(None, without.canonical_graph);

        // The counting engine keeps the input order: 1, 0, 2.
        let with = canonicalizer.canonicalize(&adjacency, &packed, true).unwrap();
        assert_eq!(vec![1, 0, 2], with.labelling);
        assert_eq!(
            vec![vec![2], vec![0], vec![]],
            with.canonical_graph.unwrap().to_adjacency()
        );
    }

    #[test]
    fn context_reuse_matches_fresh_context() {
        let canonicalizer = Canonicalizer::new(BruteForceEngine);
        let mut context = CanonContext::new();

        let big = canonicalizer
            .canonicalize_in(&mut context, &cube(), &[-1, -2, -3, -4, 5, 6, 7, 8], true)
            .unwrap();
        assert_eq!(8, context.size());

        let small_graph = vec![vec![1], vec![]];
        let small = canonicalizer
            .canonicalize_in(&mut context, &small_graph, &[-1, 2], true)
            .unwrap();
        assert_eq!(2, context.size());
        assert_eq!(2, context.orbits.len());
        assert_eq!(
            canonicalizer
                .canonicalize_in(&mut CanonContext::new(), &small_graph, &[-1, 2], true)
                .unwrap(),
            small
        );
        assert_eq!(8, big.labelling.len());
    }

    #[test]
    fn isomorphic_inputs_share_canonical_form() {
        let canonicalizer = Canonicalizer::new(BruteForceEngine);
        let adjacency = vec![vec![1, 2], vec![2], vec![3], vec![], vec![0, 3]];
        let packed = [-1, 2, -3, 4, 5];
        let permutation = [3, 0, 4, 1, 2];

        let first = canonicalizer.canonicalize(&adjacency, &packed, true).unwrap();
        let permuted = permute(&adjacency, &permutation);
        let second = canonicalizer
            .canonicalize(&permuted, &permute_packed(&packed, &permutation), true)
            .unwrap();

        assert!(first.canonical_graph.is_some());
        assert_eq!(first.canonical_graph, second.canonical_graph);
        // Both labellings lead to the same vertex once the permutation is applied.
        let mapped = first
            .labelling
            .iter()
            .map(|&vertex| permutation[vertex as usize])
            .collect::<Vec<_>>();
        assert_eq!(mapped, second.labelling);
    }

    #[test]
    fn timing_mode() {
        let settings = Settings {
            output: OutputMode::Timing,
            ..Settings::default()
        };
        let canonicalizer = Canonicalizer::with_settings(CountingEngine::new(), settings);
        let outcome = canonicalizer
            .run_in(&mut CanonContext::new(), &cube(), &[-1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();
        assert!(matches!(outcome, Outcome::Timing(_)));
        assert!(canonicalizer
            .canonicalize_timed(&cube(), &[-1, 2, 3, 4, 5, 6, 7, 8])
            .is_ok());
    }

    #[test]
    fn batch_keeps_job_order() {
        let canonicalizer = Canonicalizer::new(BruteForceEngine);
        let jobs = vec![
            CanonJob {
                adjacency: vec![vec![1], vec![]],
                colouring: vec![-1, 2],
            },
            CanonJob {
                adjacency: vec![vec![1], vec![]],
                colouring: vec![1, 2],
            },
            CanonJob {
                adjacency: vec![vec![]],
                colouring: vec![-1],
            },
        ];

        let results = canonicalizer.canonicalize_batch(&jobs);
        assert_eq!(3, results.len());
        assert!(matches!(&results[0], Ok(Outcome::Labelling(canonical)) if canonical.labelling.len() == 2));
        assert!(matches!(&results[1], Err(Error::InvalidColouring(_))));
        assert!(matches!(&results[2], Ok(Outcome::Labelling(canonical)) if canonical.labelling == vec![0]));
    }

    /// Canonicalizes another graph from within the engine call.
    struct NestingEngine<'a> {
        inner: &'a Canonicalizer<CountingEngine>,
    }

    impl CanonicalFormEngine for NestingEngine<'_> {
        fn canonical_labelling(
            &self,
            _graph: &SparseGraph,
            _labels: &mut [VertexIndex],
            _partition: &mut [c_int],
            _orbits: &mut [VertexIndex],
            _options: &EngineOptions,
        ) -> Result<EngineReport, Error> {
            let nested = self.inner.canonicalize(&[vec![1], vec![]], &[-2, 1], false)?;
            assert_eq!(vec![1, 0], nested.labelling);
            Ok(EngineReport::success(None))
        }
    }

    #[test]
    fn nested_calls_get_their_own_context() {
        let inner = Canonicalizer::new(CountingEngine::new());
        let outer = Canonicalizer::new(NestingEngine { inner: &inner });

        let canonical = outer.canonicalize(&cube(), &[-1, 2, 3, 4, 5, 6, 7, 8], false).unwrap();
        assert_eq!(vec![0, 1, 2, 3, 4, 5, 6, 7], canonical.labelling);
        assert_eq!(1, inner.engine().calls());
    }

    fn arb_input() -> impl Strategy<Value = (Vec<Vec<VertexIndex>>, Vec<c_int>)> {
        (0usize..6).prop_flat_map(|size| {
            let vertex = 0..size.max(1) as VertexIndex;
            (
                proptest::collection::vec(proptest::collection::vec(vertex, 0..4), size),
                Just((0..size as VertexIndex).collect::<Vec<_>>()).prop_shuffle(),
                proptest::collection::vec(any::<bool>(), size),
            )
                .prop_map(|(adjacency, order, starts)| {
                    let packed = order
                        .iter()
                        .zip(starts)
                        .enumerate()
                        .map(|(position, (&vertex, start))| {
                            if position == 0 || start {
                                -(vertex + 1)
                            } else {
                                vertex + 1
                            }
                        })
                        .collect::<Vec<c_int>>();
                    (adjacency, packed)
                })
        })
    }

    proptest! {
        #[test]
        fn prop_labelling_is_bijection((adjacency, packed) in arb_input()) {
            let canonicalizer = Canonicalizer::new(BruteForceEngine);
            let canonical = canonicalizer.canonicalize(&adjacency, &packed, true).unwrap();
            prop_assert!(is_permutation(&canonical.labelling, adjacency.len()));

            let graph = SparseGraph::from_adjacency(&adjacency).unwrap();
            prop_assert_eq!(
                Some(apply_labelling(&graph, &canonical.labelling).unwrap()),
                canonical.canonical_graph
            );
        }
    }
}
