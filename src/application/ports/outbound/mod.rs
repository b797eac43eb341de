//! Outbound ports - Interfaces that the application requires from external systems

mod content_generation_port;
mod repository_port;
mod settings_port;

pub use content_generation_port::{ContentGenerationPort, GenerationError};
pub use repository_port::{JourneyCircleRepositoryPort, RepositoryError};
pub use settings_port::{SettingsError, SettingsRepositoryPort};
