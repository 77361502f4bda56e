mod queue;
pub use queue::{best_first_search, SearchNode, SearchQueue};

mod exact_match;
pub use exact_match::{
    max_unified_match, AStarMatcher, MatchOutcome, SolverInfeasibleError, UnifiedMatcher,
};

mod multialign;
pub use multialign::{
    approximate_multialign, InconsistentLayerError, LayerSequence, MultialignParams,
    SearchExhaustedError,
};
