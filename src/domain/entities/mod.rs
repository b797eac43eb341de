//! Domain entities - Core business objects with identity

mod asset_draft;
mod brain_content;
mod journey_circle;
mod offer;
mod problem;
mod solution;
mod suggestion;

pub use asset_draft::{AssetDraft, AssetTarget, DraftState};
pub use brain_content::{BrainContentItem, BrainContentKind};
pub use journey_circle::{CircleStatus, JourneyCircle};
pub use offer::Offer;
pub use problem::Problem;
pub use solution::Solution;
pub use suggestion::{merge_regenerated, Suggestion, SuggestionScope};
