//! Value objects - Immutable objects defined by their attributes

mod generation;
mod ids;
mod settings;
mod web_address;
mod wizard_step;

pub use generation::{
    GeneratedDraft, GenerationContext, GenerationKind, GenerationRequest, GenerationTicket,
    SourceMaterial,
};
pub use ids::*;
pub use settings::{OfferPolicy, WorkflowSettings};
pub use web_address::WebAddress;
pub use wizard_step::{WizardStep, WorkflowPosition};
