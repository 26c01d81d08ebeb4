//! Cheap keyword test for local relevance, checked before any AI call.

use crate::types::Article;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceRule {
    pub keyword: String,
    pub local_category_markers: Vec<String>,
}

impl Default for RelevanceRule {
    fn default() -> Self {
        Self {
            keyword: "singapore".to_string(),
            local_category_markers: vec!["singapore".to_string(), "local".to_string()],
        }
    }
}

impl RelevanceRule {
    /// True when the keyword appears in the title or content, the article's
    /// location is the keyword, or its category carries a local marker.
    /// All comparisons ignore case.
    pub fn matches(&self, article: &Article) -> bool {
        let keyword = self.keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return false;
        }

        if article.title.to_lowercase().contains(&keyword)
            || article.content.to_lowercase().contains(&keyword)
        {
            return true;
        }

        if article
            .location
            .as_deref()
            .is_some_and(|l| l.trim().to_lowercase() == keyword)
        {
            return true;
        }

        article.category.as_deref().is_some_and(|category| {
            let category = category.to_lowercase();
            self.local_category_markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .any(|m| !m.is_empty() && category.contains(&m))
        })
    }
}
