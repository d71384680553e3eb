use std::future::Future;

use super::cluster_error::ClusterError;
use super::ecs_types::ListPage;

/// Follows continuation cursors until the provider stops returning one.
///
/// An empty first page ends the listing. Any failed page call fails the
/// whole listing and nothing collected so far is returned.
pub async fn list_all<F, Fut>(resource: &str, mut list_page: F) -> Result<Vec<String>, ClusterError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListPage, ClusterError>>,
{
    let mut ids: Vec<String> = Vec::new();
    let mut next_token = None;
    let mut pages = 0usize;
    loop {
        let page = list_page(next_token.take()).await?;
        pages += 1;
        ids.extend(page.ids);
        if ids.is_empty() {
            log::debug!("No {} identifiers found", resource);
            return Ok(ids);
        }
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => {
                log::debug!(
                    "Listed {} {} identifiers over {} page(s)",
                    ids.len(),
                    resource,
                    pages
                );
                return Ok(ids);
            }
        }
    }
}
