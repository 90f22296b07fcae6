//! Tag-based redirect routing
//!
//! The submitted `tags` field is free text; a category is picked by looking
//! for known tokens inside it.

use crate::config::RedirectConfig;

/// Redirect category recognised in the `tags` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    Advisory,
    Newsletter,
}

impl TagCategory {
    /// Categories in matching priority order
    const ORDER: [Self; 2] = [Self::Advisory, Self::Newsletter];

    pub const fn tokens(self) -> &'static [&'static str] {
        match self {
            Self::Advisory => &["asesoria_empresa", "asesoria_casa"],
            Self::Newsletter => &["newsletter"],
        }
    }

    /// Find the first category whose token appears in `tags`
    pub fn resolve(tags: &str) -> Option<Self> {
        Self::ORDER
            .into_iter()
            .find(|category| category.tokens().iter().any(|token| tags.contains(token)))
    }
}

/// Redirect URLs keyed by category, resolved from configuration
#[derive(Debug, Clone)]
pub struct RedirectTargets {
    advisory: String,
    newsletter: String,
}

impl RedirectTargets {
    /// Build from configuration; `None` when a category has no URL
    pub fn from_config(config: &RedirectConfig) -> Option<Self> {
        Some(Self {
            advisory: config.advisory.clone()?,
            newsletter: config.newsletter.clone()?,
        })
    }

    pub fn target_for(&self, category: TagCategory) -> &str {
        match category {
            TagCategory::Advisory => &self.advisory,
            TagCategory::Newsletter => &self.newsletter,
        }
    }

    /// Resolve `tags` straight to a redirect URL
    pub fn route(&self, tags: &str) -> Option<&str> {
        TagCategory::resolve(tags).map(|category| self.target_for(category))
    }
}
