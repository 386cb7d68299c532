//! Blog composites: posts joined with their authors.

use cache::keys;
use common::{PaginatedResponse, create_pagination_meta, merge_arrays_by_key};
use domain::{BlogComposite, BlogListQuery, BlogPost, ServicePattern, UpstreamPage};

use crate::Result;
use crate::composer::{Composed, ReadComposer, unique_ids};

impl ReadComposer {
    /// Returns one page of blog posts with author accounts attached.
    #[tracing::instrument(skip(self))]
    pub async fn blog_list_composite(
        &self,
        query: BlogListQuery,
    ) -> Result<PaginatedResponse<BlogComposite>> {
        let query = BlogListQuery {
            page: query.page.normalized(),
            ..query
        };
        let key = keys::list(keys::BLOGS, &query.cache_fragment());
        self.cached(&key, || self.load_blog_page(&query)).await
    }

    async fn load_blog_page(
        &self,
        query: &BlogListQuery,
    ) -> Result<Composed<PaginatedResponse<BlogComposite>>> {
        let page: UpstreamPage<BlogPost> = self
            .client
            .call_with_retry(ServicePattern::BlogList, query, self.config.retry)
            .await?;

        let author_ids = unique_ids(page.data.iter().map(|p| &p.author_id));
        let (authors, degraded) = self.fetch_accounts(&author_ids).await;

        let data = merge_arrays_by_key(
            page.data,
            authors,
            |p| p.author_id.clone(),
            |a| a.id.clone(),
            |post, author| BlogComposite {
                post,
                author: author.cloned(),
            },
        );

        let meta = create_pagination_meta(query.page.page, query.page.limit, page.total);
        Ok(Composed {
            value: PaginatedResponse::new(data, meta),
            degraded,
        })
    }
}
