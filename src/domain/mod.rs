//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: JourneyCircle, Problem, Solution, Offer, AssetDraft, etc.
//! - Value Objects: ids, wizard steps, settings, generation requests
//! - Aggregates: the journey circle aggregate (step data store)
//! - Domain Services: step validators, circle projector, workflow state machine
//! - Errors: the workflow error taxonomy

pub mod aggregates;
pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;
