//! Application services - Use case implementations
//!
//! Services accept port dependencies as trait objects and return view models
//! built from the domain state machine.

pub mod generation_service;
pub mod settings_service;
pub mod wizard_service;

pub use generation_service::GenerationService;
pub use settings_service::SettingsService;
pub use wizard_service::{WizardError, WizardService};
