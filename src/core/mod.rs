// Core algorithm exports
pub mod distance;
pub mod pipeline;
pub mod scoring;
pub mod zip;

pub use distance::{haversine_miles, valid_coordinates};
pub use pipeline::{
    MatchingPipeline, PipelineError, RunOptions, BATCH_SIZE, CONCURRENT_BATCHES, DEFAULT_MIN_SCORE,
};
pub use scoring::score_match;
pub use zip::{extract_zip, is_in_preferred_zip, normalize_zip};
