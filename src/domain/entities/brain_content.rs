//! Brain content - Raw source material fed to content generation

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BrainContentId, WebAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainContentKind {
    Url,
    Text,
    File,
}

impl std::fmt::Display for BrainContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrainContentKind::Url => write!(f, "url"),
            BrainContentKind::Text => write!(f, "text"),
            BrainContentKind::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainContentItem {
    pub id: BrainContentId,
    pub kind: BrainContentKind,
    pub value: String,
    pub title: String,
}

impl BrainContentItem {
    /// Build an item, checking only the format its kind implies
    pub fn new(
        id: BrainContentId,
        kind: BrainContentKind,
        value: impl Into<String>,
    ) -> Result<Self, String> {
        let value = value.into();
        let value = match kind {
            BrainContentKind::Url => WebAddress::parse(&value)?.to_string(),
            BrainContentKind::Text | BrainContentKind::File => {
                if value.trim().is_empty() {
                    return Err(format!("{} brain content cannot be empty", kind));
                }
                value
            }
        };
        let title = derive_title(kind, &value);
        Ok(Self {
            id,
            kind,
            value,
            title,
        })
    }
}

/// Display title derived from the stored value
fn derive_title(kind: BrainContentKind, value: &str) -> String {
    match kind {
        BrainContentKind::Url => value.to_string(),
        BrainContentKind::File => value
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(value)
            .to_string(),
        BrainContentKind::Text => {
            let first_line = value.lines().next().unwrap_or("").trim();
            let mut title: String = first_line.chars().take(60).collect();
            if first_line.chars().count() > 60 {
                title.push_str("...");
            }
            title
        }
    }
}
