//! AI-assisted project generation.
//!
//! Generators are interchangeable behind [`ProjectGenerator`]; which one the
//! server uses is decided by configuration at startup.

pub mod mock;
pub mod openai;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{AiConfig, AiProvider};
use crate::error::AppError;
use crate::models::Priority;

const MAX_BOARDS: usize = 5;
const MAX_COLUMNS: usize = 8;
const MAX_CARDS: usize = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub name: String,
    pub description: String,
    pub organization_name: String,
    pub team_size: Option<u32>,
    pub duration_weeks: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub boards: Vec<GeneratedBoard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedBoard {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<GeneratedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedColumn {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<GeneratedCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
}

/// Models sometimes invent priorities ("critical", "P1"); fall back to the default.
fn lenient_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().to_lowercase().parse().ok())
        .unwrap_or_default())
}

impl GeneratedProject {
    /// Drop blank entries, cap sizes and make sure there is something to save.
    pub fn sanitize(mut self, fallback_name: &str) -> Result<Self, GenerationError> {
        if self.name.trim().is_empty() {
            self.name = fallback_name.to_string();
        }

        self.boards.retain(|b| !b.name.trim().is_empty());
        self.boards.truncate(MAX_BOARDS);
        for board in &mut self.boards {
            board.columns.retain(|c| !c.name.trim().is_empty());
            board.columns.truncate(MAX_COLUMNS);
            for column in &mut board.columns {
                column.cards.retain(|c| !c.title.trim().is_empty());
                column.cards.truncate(MAX_CARDS);
            }
        }

        if self.boards.is_empty() {
            return Err(GenerationError::invalid("Generated project has no boards"));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// The provider could not be reached or its reply was unusable.
    Upstream,
    /// The outline parsed but had nothing worth saving.
    Invalid,
}

#[derive(Debug)]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn upstream(message: impl Into<String>) -> Self {
        GenerationError {
            kind: GenerationErrorKind::Upstream,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        GenerationError {
            kind: GenerationErrorKind::Invalid,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err.kind {
            GenerationErrorKind::Upstream => AppError::Upstream(err.message),
            GenerationErrorKind::Invalid => {
                AppError::BadRequest(format!("Project generation failed: {}", err.message))
            }
        }
    }
}

#[async_trait]
pub trait ProjectGenerator: Send + Sync {
    fn id(&self) -> &str;
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedProject, GenerationError>;
}

pub fn build_generator(config: &AiConfig) -> Result<Arc<dyn ProjectGenerator>, String> {
    match &config.provider {
        AiProvider::Mock => Ok(Arc::new(mock::MockGenerator)),
        AiProvider::OpenAi {
            api_key,
            model,
            base_url,
        } => Ok(Arc::new(openai::OpenAiGenerator::new(
            api_key.clone(),
            model.clone(),
            base_url.clone(),
        )?)),
    }
}
