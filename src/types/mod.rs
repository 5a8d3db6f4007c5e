use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============= Chat Types =============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Speaker label used when a message is rendered into a prompt.
    pub fn label(self) -> &'static str {
        match self {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============= Community Types =============

/// Forum topic. Values the store holds that are not in this set decode as `General`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AcademicStress,
    Loneliness,
    FamilyIssues,
    Anxiety,
    Relationships,
    SelfDiscovery,
    #[default]
    #[serde(other)]
    General,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::AcademicStress,
        Category::Loneliness,
        Category::FamilyIssues,
        Category::Anxiety,
        Category::General,
        Category::Relationships,
        Category::SelfDiscovery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::AcademicStress => "academic_stress",
            Category::Loneliness => "loneliness",
            Category::FamilyIssues => "family_issues",
            Category::Anxiety => "anxiety",
            Category::General => "general",
            Category::Relationships => "relationships",
            Category::SelfDiscovery => "self_discovery",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::AcademicStress => "Academic Stress",
            Category::Loneliness => "Loneliness",
            Category::FamilyIssues => "Family",
            Category::Anxiety => "Anxiety",
            Category::General => "General",
            Category::Relationships => "Relationships",
            Category::SelfDiscovery => "Self Discovery",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::AcademicStress => "📚",
            Category::Loneliness => "🌙",
            Category::FamilyIssues => "🏠",
            Category::Anxiety => "💭",
            Category::General => "💬",
            Category::Relationships => "💕",
            Category::SelfDiscovery => "🌱",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown category: {}", s)))
    }
}

/// Post listing filter: every category, or exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "all" => Ok(CategoryFilter::All),
            other => other.parse().map(CategoryFilter::Only),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostReaction {
    Heart,
    Hug,
    Same,
    Strength,
}

impl PostReaction {
    pub fn as_str(self) -> &'static str {
        match self {
            PostReaction::Heart => "heart",
            PostReaction::Hug => "hug",
            PostReaction::Same => "same",
            PostReaction::Strength => "strength",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentReaction {
    Heart,
    Hug,
}

impl CommentReaction {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentReaction::Heart => "heart",
            CommentReaction::Hug => "hug",
        }
    }
}

/// Reaction counters on a post. Keys missing in the stored map read as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PostReactions {
    pub heart: u64,
    pub hug: u64,
    pub same: u64,
    pub strength: u64,
}

impl PostReactions {
    pub fn get(&self, kind: PostReaction) -> u64 {
        match kind {
            PostReaction::Heart => self.heart,
            PostReaction::Hug => self.hug,
            PostReaction::Same => self.same,
            PostReaction::Strength => self.strength,
        }
    }

    /// Returns a copy with `kind` incremented by one.
    pub fn incremented(mut self, kind: PostReaction) -> Self {
        let slot = match kind {
            PostReaction::Heart => &mut self.heart,
            PostReaction::Hug => &mut self.hug,
            PostReaction::Same => &mut self.same,
            PostReaction::Strength => &mut self.strength,
        };
        *slot = slot.saturating_add(1);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommentReactions {
    pub heart: u64,
    pub hug: u64,
}

impl CommentReactions {
    pub fn get(&self, kind: CommentReaction) -> u64 {
        match kind {
            CommentReaction::Heart => self.heart,
            CommentReaction::Hug => self.hug,
        }
    }

    pub fn incremented(mut self, kind: CommentReaction) -> Self {
        let slot = match kind {
            CommentReaction::Heart => &mut self.heart,
            CommentReaction::Hug => &mut self.hug,
        };
        *slot = slot.saturating_add(1);
        self
    }
}

fn default_anonymous_name() -> String {
    "Anonymous".to_string()
}

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumPost {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: Category,
    #[serde(default = "default_anonymous_name")]
    pub anonymous_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: PostReactions,
    pub created_date: DateTime<Utc>,
    /// Store revision, used for optimistic concurrency.
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumComment {
    pub id: String,
    pub post_id: String,
    pub content: String,
    #[serde(default = "default_anonymous_name")]
    pub anonymous_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: CommentReactions,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: String,
    pub content: String,
}

// ============= Expert Types =============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expert {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub sessions_completed: Option<u32>,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("A reply is still being written for this session")]
    Busy,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Entity store error: {0}")]
    Store(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::Busy | AppError::Cancelled => StatusCode::CONFLICT,
            AppError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::Inference(_) | AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
