//! [`SearchGateway`] implementation backed by the PostgREST client.

use crate::application::services::catalog::{SearchGateway, ServicePage};
use crate::domain::catalog::{ReferenceOption, ServiceItem};
use crate::infrastructure::error::RemoteResult;
use crate::infrastructure::postgrest::client::PostgrestClient;
use crate::infrastructure::postgrest::query::{RowRange, SearchQuery};
use async_trait::async_trait;

/// Remote view the search queries run against.
const SEARCH_VIEW: &str = "v_service_search";

#[async_trait]
impl SearchGateway for PostgrestClient {
    async fn fetch_services(
        &self,
        query: &SearchQuery,
        range: RowRange,
    ) -> RemoteResult<ServicePage> {
        let page = self
            .select::<ServiceItem>(SEARCH_VIEW, query.params(), Some(range), true)
            .await?;
        Ok(ServicePage {
            rows: page.rows,
            total: page.total,
        })
    }

    async fn fetch_reference(&self, table: &str) -> RemoteResult<Vec<ReferenceOption>> {
        let params = vec![
            ("select".to_string(), "code,label".to_string()),
            ("order".to_string(), "label.asc".to_string()),
        ];
        let page = self
            .select::<ReferenceOption>(table, &params, None, false)
            .await?;
        Ok(page.rows)
    }
}
