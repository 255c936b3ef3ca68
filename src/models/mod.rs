// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BuyerPreferences, BuyerRecord, Coordinates, MatchRecord, MatchRunStats, MatchScore,
    MatchUpdate, NewMatch, PipelineStage, PropertyAttributes, PropertyRecord,
};
pub use requests::{BuyerRunRequest, ClearMatchesRequest, PropertyRunRequest, RunMatchingRequest};
pub use responses::{ClearMatchesResponse, ErrorResponse, HealthResponse, MatchRunResponse};
