//! # Catalog Service
//!
//! Orchestrates search, point lookups and reference taxonomy reads against
//! the remote data source.
//!
//! The business-card path must aggregate over the FULL matching row set
//! before pagination (a business with N services collapses to one card), so
//! it retrieves all rows in fixed-size chunks. That retrieval is bounded by
//! a hard cap; exceeding the cap is an explicit error rather than silent
//! truncation or unbounded accumulation.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::aggregation::{build_business_cards, build_business_summary};
use crate::domain::catalog::{
    BusinessDetail, PagedResult, ReferenceOption, References, ServiceItem,
};
use crate::domain::filters::{CardScope, Filters, ViewMode};
use crate::infrastructure::error::RemoteResult;
use crate::infrastructure::postgrest::{
    RowRange, SELECT_FIELDS_BUSINESS_LIGHT, SELECT_FIELDS_FULL, SearchQuery,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Chunk size for full-result-set retrieval.
const FETCH_CHUNK_SIZE: u64 = 1000;

/// Hard cap on rows accumulated for one aggregation.
const FETCH_ROW_CAP: u64 = 50_000;

/// One fetched chunk of service rows plus the reported exact total.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServicePage {
    /// Rows of this chunk.
    pub rows: Vec<ServiceItem>,
    /// Exact total reported by the source.
    pub total: u64,
}

/// Port to the remote search view and reference tables.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Fetches one range of service rows with an exact count.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport or decoding failure.
    async fn fetch_services(
        &self,
        query: &SearchQuery,
        range: RowRange,
    ) -> RemoteResult<ServicePage>;

    /// Reads a code/label reference table, ordered by label.
    ///
    /// # Errors
    ///
    /// Returns a remote error on transport or decoding failure.
    async fn fetch_reference(&self, table: &str) -> RemoteResult<Vec<ReferenceOption>>;
}

/// Search, lookup and reference reads over a [`SearchGateway`].
#[derive(Clone)]
pub struct CatalogService {
    gateway: Arc<dyn SearchGateway>,
}

impl CatalogService {
    /// Creates the service over a gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn SearchGateway>) -> Self {
        Self { gateway }
    }

    /// Lists one page of search results.
    ///
    /// Business-card scope aggregates the full matching row set and
    /// paginates the cards; every other view pages service rows directly at
    /// the source.
    ///
    /// # Errors
    ///
    /// Returns a remote error on upstream failure, or
    /// [`ApplicationError::ResultSetTooLarge`] when aggregation would
    /// exceed the row cap.
    pub async fn list_items(&self, filters: &Filters) -> ApplicationResult<PagedResult> {
        if filters.view == ViewMode::Cards && filters.scope == CardScope::Businesses {
            return self.list_business_cards(filters).await;
        }

        let query = SearchQuery::for_filters(filters, SELECT_FIELDS_FULL);
        let range = RowRange::for_page(filters.page, filters.page_size);
        let page = self.gateway.fetch_services(&query, range).await?;

        Ok(PagedResult {
            total: page.total,
            total_pages: total_pages(page.total, filters.page_size),
            page: filters.page,
            page_size: filters.page_size,
            services: page.rows,
            businesses: Vec::new(),
        })
    }

    /// Looks up one service row by id.
    ///
    /// # Errors
    ///
    /// Returns a remote error on upstream failure.
    pub async fn get_service(&self, service_id: &str) -> ApplicationResult<Option<ServiceItem>> {
        let query = SearchQuery::by_service_id(service_id);
        let page = self
            .gateway
            .fetch_services(&query, RowRange { from: 0, to: 0 })
            .await?;
        Ok(page.rows.into_iter().next())
    }

    /// Fetches a business with all of its services.
    ///
    /// # Errors
    ///
    /// Returns a remote error on upstream failure, or the row-cap error for
    /// pathologically large businesses.
    pub async fn get_business_detail(
        &self,
        business_id: &str,
    ) -> ApplicationResult<Option<BusinessDetail>> {
        let query = SearchQuery::by_business_id(business_id);
        let services = self.fetch_all_rows(&query).await?;
        let Some(business) = build_business_summary(&services) else {
            return Ok(None);
        };
        Ok(Some(BusinessDetail { business, services }))
    }

    /// Reads both reference taxonomies in parallel.
    ///
    /// # Errors
    ///
    /// Returns a remote error when either read fails.
    pub async fn get_references(&self) -> ApplicationResult<References> {
        let (business_types, service_categories) = futures::future::try_join(
            self.gateway.fetch_reference("business_types"),
            self.gateway.fetch_reference("service_categories"),
        )
        .await?;
        Ok(References {
            business_types,
            service_categories,
        })
    }

    async fn list_business_cards(&self, filters: &Filters) -> ApplicationResult<PagedResult> {
        let query = SearchQuery::for_filters(filters, SELECT_FIELDS_BUSINESS_LIGHT);
        let rows = self.fetch_all_rows(&query).await?;
        let cards = build_business_cards(&rows);

        let total = cards.len() as u64;
        let from = usize::try_from(
            u64::from(filters.page.saturating_sub(1)) * u64::from(filters.page_size),
        )
        .unwrap_or(usize::MAX);
        let businesses: Vec<_> = cards
            .into_iter()
            .skip(from)
            .take(filters.page_size as usize)
            .collect();

        Ok(PagedResult {
            total,
            total_pages: total_pages(total, filters.page_size),
            page: filters.page,
            page_size: filters.page_size,
            services: Vec::new(),
            businesses,
        })
    }

    /// Retrieves every matching row in fixed-size chunks.
    ///
    /// Stops when a chunk comes back short or empty, or when the
    /// accumulated count reaches the reported total. Aborts with
    /// [`ApplicationError::ResultSetTooLarge`] once the row cap is crossed.
    async fn fetch_all_rows(&self, query: &SearchQuery) -> ApplicationResult<Vec<ServiceItem>> {
        let mut rows: Vec<ServiceItem> = Vec::new();
        let mut from: u64 = 0;

        loop {
            let range = RowRange {
                from,
                to: from + FETCH_CHUNK_SIZE - 1,
            };
            let page = self.gateway.fetch_services(query, range).await?;
            let fetched = page.rows.len() as u64;

            rows.extend(page.rows);
            let accumulated = rows.len() as u64;
            if accumulated > FETCH_ROW_CAP {
                return Err(ApplicationError::ResultSetTooLarge {
                    fetched: accumulated,
                    cap: FETCH_ROW_CAP,
                });
            }

            if fetched == 0 || fetched < FETCH_CHUNK_SIZE || accumulated >= page.total {
                break;
            }
            from += FETCH_CHUNK_SIZE;
        }

        Ok(rows)
    }
}

fn total_pages(total: u64, page_size: u32) -> u64 {
    let size = u64::from(page_size.max(1));
    total.div_ceil(size).max(1)
}
