use chrono::{DateTime, Utc};
use common::PageQuery;
use serde::{Deserialize, Serialize};

use super::accounts::StaffAccount;
use super::fragment_value;

/// A blog post owned by the content service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub author_id: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// A blog post joined with its author's staff account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogComposite {
    #[serde(flatten)]
    pub post: BlogPost,
    pub author: Option<StaffAccount>,
}

/// Filters accepted by `orchestrator.blog.listComposite`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl BlogListQuery {
    /// Stable cache-key fragment covering every identifying parameter.
    pub fn cache_fragment(&self) -> String {
        format!(
            "page={}:limit={}:search={}:author={}",
            self.page.page,
            self.page.limit,
            fragment_value(self.search.as_deref()),
            fragment_value(self.author_id.as_deref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_fragment_keeps_search_and_author_apart() {
        let a = BlogListQuery {
            search: Some("care:author=".into()),
            ..Default::default()
        };
        let b = BlogListQuery {
            search: Some("care".into()),
            author_id: Some(":author=".into()),
            ..Default::default()
        };

        assert_ne!(a.cache_fragment(), b.cache_fragment());
        assert_eq!(
            BlogListQuery::default().cache_fragment(),
            "page=1:limit=10:search=:author="
        );
    }
}
