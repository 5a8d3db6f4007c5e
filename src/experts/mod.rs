//! Experts directory
//!
//! Read-only listing of verified mental-health professionals held in the
//! entity store, plus the small derivations the directory cards display.

use crate::store::{EntityKind, EntityStore, OrderSpec, decode, decode_all};
use crate::types::{Expert, Result};
use serde::Serialize;
use std::sync::Arc;

/// Specializations shown on a card before collapsing into `+N`.
pub const CARD_SPECIALIZATIONS: usize = 3;

pub struct ExpertDirectory {
    store: Arc<dyn EntityStore>,
}

impl ExpertDirectory {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// All experts, best rated first.
    pub async fn list_experts(&self) -> Result<Vec<Expert>> {
        let records = self
            .store
            .list(EntityKind::Expert, &OrderSpec::descending("rating"))
            .await?;
        decode_all(EntityKind::Expert, records)
    }

    pub async fn get_expert(&self, id: &str) -> Result<Expert> {
        let record = self.store.get(EntityKind::Expert, id).await?;
        decode(EntityKind::Expert, record)
    }
}

/// Case-insensitive match on name, title or any specialization. A blank
/// query keeps everyone.
pub fn search_experts(experts: &[Expert], query: &str) -> Vec<Expert> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return experts.to_vec();
    }

    experts
        .iter()
        .filter(|e| {
            e.name.to_lowercase().contains(&needle)
                || e.title.to_lowercase().contains(&needle)
                || e.specializations
                    .iter()
                    .any(|s| s.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// An expert plus the fields a directory card derives from it.
#[derive(Debug, Clone, Serialize)]
pub struct ExpertCard {
    #[serde(flatten)]
    pub expert: Expert,
    pub initial: String,
    pub top_specializations: Vec<String>,
    pub more_specializations: usize,
    pub rating_label: Option<String>,
}

impl From<Expert> for ExpertCard {
    fn from(expert: Expert) -> Self {
        let initial = expert
            .name
            .chars()
            .next()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "E".to_string());
        let top_specializations = expert
            .specializations
            .iter()
            .take(CARD_SPECIALIZATIONS)
            .cloned()
            .collect();
        let more_specializations = expert
            .specializations
            .len()
            .saturating_sub(CARD_SPECIALIZATIONS);
        let rating_label = expert.rating.map(|r| format!("{:.1}", r));

        Self {
            expert,
            initial,
            top_specializations,
            more_specializations,
            rating_label,
        }
    }
}
