use crate::colouring::BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Return the canonical labelling.
    Labelling,
    /// Return how long building and canonicalizing took.
    Timing,
}

impl Default for OutputMode {
    fn default() -> Self {
        Self::Labelling
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// How class boundaries are marked in packed colourings.
    pub marker: BlockMarker,
    /// Also compute the canonically labelled graph.
    pub compute_canonical_form: bool,
    /// Labelling or timing.
    pub output: OutputMode,
}
