//! Ollama client for content generation
//!
//! Talks to the OpenAI-compatible `/chat/completions` endpoint. Prompts are
//! built here from the structured `GenerationContext`; titles come back one
//! per line, outlines and content verbatim.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{ContentGenerationPort, GenerationError};
use crate::domain::value_objects::{GeneratedDraft, GenerationContext, GenerationKind};

/// Client for an Ollama server
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Send one chat completion and return the first choice's text
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, error = %error_text, "Ollama API error");
            return Err(GenerationError::Api(format!("{}: {}", status, error_text)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("no choices returned".to_string()))
    }
}

#[async_trait]
impl ContentGenerationPort for OllamaClient {
    async fn generate(
        &self,
        kind: GenerationKind,
        context: &GenerationContext,
    ) -> Result<GeneratedDraft, GenerationError> {
        let messages = vec![
            ChatMessage::new("system", system_prompt(kind)),
            ChatMessage::new("user", user_prompt(kind, context)),
        ];
        let start = std::time::Instant::now();
        let text = self.chat(messages).await?;
        tracing::debug!(
            model = %self.model,
            %kind,
            duration_ms = start.elapsed().as_millis() as u64,
            "Ollama chat completion"
        );

        match kind {
            GenerationKind::ProblemTitles | GenerationKind::SolutionTitles => {
                let titles = parse_titles(&text, &context.confirmed_titles, context.max_titles);
                if titles.is_empty() {
                    return Err(GenerationError::InvalidResponse(
                        "response contained no titles".to_string(),
                    ));
                }
                Ok(GeneratedDraft::Titles(titles))
            }
            GenerationKind::AssetOutline => Ok(GeneratedDraft::Outline(non_empty(text)?)),
            GenerationKind::AssetContent => Ok(GeneratedDraft::Content(non_empty(text)?)),
        }
    }
}

fn non_empty(text: String) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::InvalidResponse("empty response".to_string()));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Prompts
// ============================================================================

fn system_prompt(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::ProblemTitles => {
            "You help a consultant describe the problems their clients face. \
             Reply with short problem titles, one per line, with no numbering and no commentary."
        }
        GenerationKind::SolutionTitles => {
            "You help a consultant describe how they solve a client problem. \
             Reply with short solution titles, one per line, with no numbering and no commentary."
        }
        GenerationKind::AssetOutline => {
            "You outline marketing content. Reply with a concise outline as a list of sections."
        }
        GenerationKind::AssetContent => {
            "You write marketing content. Follow the approved outline and reply with the finished text only."
        }
    }
}

fn user_prompt(kind: GenerationKind, context: &GenerationContext) -> String {
    let mut prompt = String::new();

    if !context.brain_content.is_empty() {
        prompt.push_str("Source material:\n");
        for item in &context.brain_content {
            prompt.push_str(&format!("- [{}] {}: {}\n", item.kind, item.title, item.value));
        }
        prompt.push('\n');
    }
    if !context.industries.is_empty() {
        let industries: Vec<String> = context.industries.iter().map(|i| i.to_string()).collect();
        prompt.push_str(&format!("Industry ids: {}\n", industries.join(", ")));
    }
    if !context.problems.is_empty() {
        prompt.push_str("Problems already in the journey circle:\n");
        for problem in &context.problems {
            prompt.push_str(&format!("- {}\n", problem));
        }
    }
    if let Some(focus) = &context.focus {
        prompt.push_str(&format!("Focus: {}\n", focus));
    }

    match kind {
        GenerationKind::ProblemTitles | GenerationKind::SolutionTitles => {
            if !context.confirmed_titles.is_empty() {
                prompt.push_str("Already chosen, do not repeat:\n");
                for title in &context.confirmed_titles {
                    prompt.push_str(&format!("- {}\n", title));
                }
            }
            let noun = if kind == GenerationKind::ProblemTitles {
                "problem"
            } else {
                "solution"
            };
            prompt.push_str(&format!(
                "\nSuggest up to {} {} titles.",
                context.max_titles, noun
            ));
        }
        GenerationKind::AssetOutline => {
            prompt.push_str(&format!(
                "\nOutline an asset titled \"{}\".",
                context.asset_title.as_deref().unwrap_or("Untitled")
            ));
        }
        GenerationKind::AssetContent => {
            prompt.push_str(&format!(
                "\nWrite the asset titled \"{}\" from this outline:\n{}",
                context.asset_title.as_deref().unwrap_or("Untitled"),
                context.outline.as_deref().unwrap_or_default()
            ));
        }
    }
    prompt
}

/// One title per line, without list markers, quotes, duplicates or titles
/// that were already confirmed
pub(crate) fn parse_titles(text: &str, confirmed: &[String], max: usize) -> Vec<String> {
    let mut seen: HashSet<String> = confirmed.iter().map(|t| t.to_lowercase()).collect();
    text.lines()
        .map(strip_list_marker)
        .map(|line| line.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace()))
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_lowercase()))
        .take(max)
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
        .unwrap_or(line);
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest;
        }
    }
    line
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
