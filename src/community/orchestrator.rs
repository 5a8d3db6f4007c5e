use super::names::AnonymousNamer;
use crate::store::{
    EntityKind, EntityStore, Filter, OrderSpec, Record, decode, decode_all, encode,
};
use crate::types::{
    AppError, Category, CategoryFilter, CommentReaction, CommentReactions, ForumComment,
    ForumPost, NewComment, NewPost, PostReaction, PostReactions, Result,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of version-checked attempts when a store has no atomic increment.
pub const DEFAULT_REACTION_RETRY_LIMIT: u32 = 5;

/// A forum category as shown in the category picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub value: Category,
    pub label: &'static str,
    pub icon: &'static str,
}

/// Posts, comments and reactions for the anonymous forum.
pub struct CommunityOrchestrator {
    store: Arc<dyn EntityStore>,
    namer: AnonymousNamer,
    reaction_retry_limit: u32,
}

impl CommunityOrchestrator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            namer: AnonymousNamer::from_entropy(),
            reaction_retry_limit: DEFAULT_REACTION_RETRY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_namer(mut self, namer: AnonymousNamer) -> Self {
        self.namer = namer;
        self
    }

    /// Attempts for the optimistic-concurrency fallback. Zero is treated as one.
    #[must_use]
    pub fn with_reaction_retry_limit(mut self, limit: u32) -> Self {
        self.reaction_retry_limit = limit.max(1);
        self
    }

    pub fn categories() -> Vec<CategoryInfo> {
        Category::ALL
            .into_iter()
            .map(|value| CategoryInfo {
                value,
                label: value.label(),
                icon: value.icon(),
            })
            .collect()
    }

    /// Posts, newest first.
    pub async fn list_posts(&self, filter: CategoryFilter) -> Result<Vec<ForumPost>> {
        let order = OrderSpec::descending("created_date");
        let records = match filter {
            CategoryFilter::All => self.store.list(EntityKind::ForumPost, &order).await?,
            CategoryFilter::Only(category) => {
                let filter = Filter::new().eq("category", category.as_str());
                self.store
                    .filter(EntityKind::ForumPost, &filter, &order)
                    .await?
            }
        };
        decode_all(EntityKind::ForumPost, records)
    }

    pub async fn get_post(&self, id: &str) -> Result<ForumPost> {
        let record = self.store.get(EntityKind::ForumPost, id).await?;
        decode(EntityKind::ForumPost, record)
    }

    #[instrument(skip(self, post), fields(category = %post.category))]
    pub async fn create_post(&self, post: NewPost) -> Result<ForumPost> {
        let title = post.title.trim();
        let content = post.content.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Post title cannot be empty".to_string()));
        }
        if content.is_empty() {
            return Err(AppError::InvalidInput("Post content cannot be empty".to_string()));
        }

        let mut fields = Record::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("content".to_string(), json!(content));
        fields.insert("category".to_string(), json!(post.category.as_str()));
        fields.insert("anonymous_name".to_string(), json!(self.namer.next_name()));
        fields.insert("reactions".to_string(), Value::Object(encode(&PostReactions::default())?));

        let record = self.store.create(EntityKind::ForumPost, fields).await?;
        let created: ForumPost = decode(EntityKind::ForumPost, record)?;
        info!(post_id = %created.id, "Forum post created");
        Ok(created)
    }

    /// Comments on a post, oldest first.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<ForumComment>> {
        let filter = Filter::new().eq("post_id", post_id);
        let records = self
            .store
            .filter(
                EntityKind::ForumComment,
                &filter,
                &OrderSpec::ascending("created_date"),
            )
            .await?;
        decode_all(EntityKind::ForumComment, records)
    }

    #[instrument(skip(self, comment), fields(post_id = %comment.post_id))]
    pub async fn create_comment(&self, comment: NewComment) -> Result<ForumComment> {
        let content = comment.content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidInput("Comment cannot be empty".to_string()));
        }
        if comment.post_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Comment must belong to a post".to_string()));
        }

        let mut fields = Record::new();
        fields.insert("post_id".to_string(), json!(comment.post_id));
        fields.insert("content".to_string(), json!(content));
        fields.insert("anonymous_name".to_string(), json!(self.namer.next_name()));
        fields.insert(
            "reactions".to_string(),
            Value::Object(encode(&CommentReactions::default())?),
        );

        let record = self.store.create(EntityKind::ForumComment, fields).await?;
        decode(EntityKind::ForumComment, record)
    }

    /// Adds one reaction of `kind` to a post and returns the updated post.
    #[instrument(skip(self))]
    pub async fn react(&self, post_id: &str, kind: PostReaction) -> Result<ForumPost> {
        let record = self
            .increment_reaction(EntityKind::ForumPost, post_id, kind.as_str(), |record| {
                let post: ForumPost = decode(EntityKind::ForumPost, record)?;
                Ok(Value::Object(encode(&post.reactions.incremented(kind))?))
            })
            .await?;
        let post: ForumPost = decode(EntityKind::ForumPost, record)?;
        debug!(count = post.reactions.get(kind), "Reaction recorded");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn react_to_comment(
        &self,
        comment_id: &str,
        kind: CommentReaction,
    ) -> Result<ForumComment> {
        let record = self
            .increment_reaction(
                EntityKind::ForumComment,
                comment_id,
                kind.as_str(),
                |record| {
                    let comment: ForumComment = decode(EntityKind::ForumComment, record)?;
                    Ok(Value::Object(encode(&comment.reactions.incremented(kind))?))
                },
            )
            .await?;
        let comment: ForumComment = decode(EntityKind::ForumComment, record)?;
        debug!(count = comment.reactions.get(kind), "Reaction recorded");
        Ok(comment)
    }

    /// Atomic increment first; version-checked read-modify-write when the
    /// store cannot do that. `bump` turns the current record into the new
    /// `reactions` value.
    async fn increment_reaction<F>(
        &self,
        kind: EntityKind,
        id: &str,
        key: &str,
        bump: F,
    ) -> Result<Record>
    where
        F: Fn(Record) -> Result<Value> + Send + Sync,
    {
        let field = format!("reactions.{}", key);
        match self.store.increment_field(kind, id, &field, 1).await {
            Err(AppError::Unsupported(_)) => {
                debug!("Store has no atomic increment, using versioned update");
            }
            other => return other,
        }

        for attempt in 1..=self.reaction_retry_limit {
            let current = self.store.get(kind, id).await?;
            let version = current.get("version").and_then(Value::as_u64).unwrap_or(0);

            let mut fields = Record::new();
            fields.insert("reactions".to_string(), bump(current)?);

            match self.store.update(kind, id, fields, Some(version)).await {
                Err(AppError::Conflict(_)) => {
                    debug!(attempt, "Reaction lost a write race, retrying");
                }
                other => return other,
            }
        }

        warn!(
            attempts = self.reaction_retry_limit,
            "Giving up on reaction after repeated conflicts"
        );
        Err(AppError::Conflict(format!(
            "{} {} kept changing; reaction not recorded",
            kind, id
        )))
    }
}

/// Case-insensitive substring match on title or content. A blank query keeps
/// every post. Runs on an already-fetched list; the store is not consulted.
pub fn search_posts(posts: &[ForumPost], query: &str) -> Vec<ForumPost> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return posts.to_vec();
    }

    posts
        .iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&needle) || p.content.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEntityStore;
    use chrono::Utc;

    fn post(title: &str, content: &str) -> ForumPost {
        ForumPost {
            id: title.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: Category::General,
            anonymous_name: "Wise Owl".to_string(),
            reactions: PostReactions::default(),
            created_date: Utc::now(),
            version: 1,
        }
    }

    #[test]
    fn test_search_posts() {
        let posts = vec![
            post("Exam Panic", "finals week"),
            post("Lonely nights", "nobody to talk to"),
        ];

        assert_eq!(search_posts(&posts, "").len(), 2);
        assert_eq!(search_posts(&posts, "   ").len(), 2);
        assert_eq!(search_posts(&posts, "EXAM")[0].title, "Exam Panic");
        assert_eq!(search_posts(&posts, "talk to")[0].title, "Lonely nights");
        assert!(search_posts(&posts, "weekend").is_empty());
    }

    #[test]
    fn test_categories_listing() {
        let categories = CommunityOrchestrator::categories();
        assert_eq!(categories.len(), 7);
        assert_eq!(categories[0].label, "Academic Stress");
        assert_eq!(categories[0].icon, "📚");
    }

    #[tokio::test]
    async fn test_create_post_rejects_blank_fields() {
        let store = Arc::new(InMemoryEntityStore::new());
        let community = CommunityOrchestrator::new(store.clone());

        let err = community
            .create_post(NewPost {
                title: "  ".to_string(),
                content: "body".to_string(),
                category: Category::Anxiety,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(store.is_empty(EntityKind::ForumPost));
    }

    #[tokio::test]
    async fn test_react_falls_back_to_versioned_update() {
        let store = Arc::new(InMemoryEntityStore::without_atomic_increment());
        let community = CommunityOrchestrator::new(store.clone());

        let created = community
            .create_post(NewPost {
                title: "t".to_string(),
                content: "c".to_string(),
                category: Category::General,
            })
            .await
            .unwrap();

        let updated = community.react(&created.id, PostReaction::Same).await.unwrap();
        assert_eq!(updated.reactions.same, 1);
        assert_eq!(updated.version, created.version + 1);
    }

    #[tokio::test]
    async fn test_react_missing_post() {
        let community = CommunityOrchestrator::new(Arc::new(InMemoryEntityStore::new()));
        let err = community.react("nope", PostReaction::Heart).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
