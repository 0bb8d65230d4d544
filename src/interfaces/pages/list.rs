//! Server-paginated list screens
//!
//! A [`ListController`] owns the page number, the fetched rows and the
//! delete confirmation of one list. What is listed, and how the search and
//! select state turns into filters, is the [`ListQuery`] of the page.

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::form::{PendingFlag, SubmitOutcome};
use crate::application::{DataProvider, Resource, LOGIN_PATH};
use crate::domain::{Filter, ListParams, Sorter};
use crate::shared::{clamp_page_size, total_pages, AdminError, AdminResult, Pagination};

/// Local filter state of a list page. `Default` is the cleared state.
pub trait ListQuery: Default + Send {
    type Row: DeserializeOwned + Send;

    const RESOURCE: Resource;

    fn filters(&self) -> Vec<Filter>;

    fn sorters(&self) -> Vec<Sorter> {
        vec![Sorter::desc("created_at")]
    }

    fn select(&self) -> Option<String> {
        None
    }

    fn is_filtered(&self) -> bool {
        !self.filters().is_empty()
    }
}

pub struct ListController<Q: ListQuery> {
    data: DataProvider,
    query: Q,
    page: u32,
    page_size: u32,
    rows: Vec<Q::Row>,
    total: u64,
    loading: bool,
    error: Option<String>,
    redirect: Option<String>,
    confirm_delete: Option<String>,
    deleting: PendingFlag,
    last_params: Option<ListParams>,
}

impl<Q: ListQuery> ListController<Q> {
    pub fn new(data: DataProvider) -> Self {
        Self::with_page_size(data, None)
    }

    pub fn with_page_size(data: DataProvider, page_size: Option<u32>) -> Self {
        Self {
            data,
            query: Q::default(),
            page: 1,
            page_size: clamp_page_size(page_size),
            rows: Vec::new(),
            total: 0,
            loading: false,
            error: None,
            redirect: None,
            confirm_delete: None,
            deleting: PendingFlag::new(),
            last_params: None,
        }
    }

    pub fn params(&self) -> ListParams {
        let mut params = ListParams::new()
            .filters(self.query.filters())
            .paginate(Pagination::new(self.page, self.page_size));
        params.sorters = self.query.sorters();
        params.select = self.query.select();
        params
    }

    pub async fn fetch(&mut self) -> AdminResult<()> {
        let params = self.params();
        self.loading = true;
        let result = self.data.list::<Q::Row>(Q::RESOURCE, &params).await;
        self.loading = false;
        self.last_params = Some(params);

        match result {
            Ok(response) => {
                debug!(resource = %Q::RESOURCE, total = response.total, page = self.page, "List fetched");
                self.rows = response.data;
                self.total = response.total;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    fn record_error(&mut self, err: &AdminError) {
        self.error = Some(err.to_string());
        if err.is_authorization_failure() {
            self.redirect = Some(LOGIN_PATH.to_string());
        }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Change the filter state; the list goes back to page 1.
    pub async fn update_query(&mut self, change: impl FnOnce(&mut Q)) -> AdminResult<()> {
        change(&mut self.query);
        self.page = 1;
        self.fetch().await
    }

    /// Search back to empty and every select back to "all".
    pub async fn clear_filters(&mut self) -> AdminResult<()> {
        self.update_query(|q| *q = Q::default()).await
    }

    pub fn rows(&self) -> &[Q::Row] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.page_size)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set after a 401/403: the session is gone.
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Parameters of the most recent fetch.
    pub fn last_params(&self) -> Option<&ListParams> {
        self.last_params.as_ref()
    }

    pub async fn set_page(&mut self, page: u32) -> AdminResult<()> {
        self.page = page.clamp(1, self.total_pages().max(1));
        self.fetch().await
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub async fn next_page(&mut self) -> AdminResult<()> {
        if !self.has_next() {
            return Ok(());
        }
        self.set_page(self.page + 1).await
    }

    pub async fn previous_page(&mut self) -> AdminResult<()> {
        if !self.has_previous() {
            return Ok(());
        }
        self.set_page(self.page - 1).await
    }

    // ── Delete with confirmation ────────────────────────────────

    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.confirm_delete = Some(id.into());
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.confirm_delete.as_deref()
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = None;
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_pending()
    }

    /// Delete the row awaiting confirmation, then refetch.
    pub async fn confirm_delete(&mut self) -> SubmitOutcome {
        let Some(_guard) = self.deleting.try_begin() else {
            return SubmitOutcome::Busy;
        };
        let Some(id) = self.confirm_delete.take() else {
            return SubmitOutcome::Invalid("Nothing selected for deletion".to_string());
        };

        if let Err(err) = self.data.delete_one(Q::RESOURCE, &id).await {
            self.record_error(&err);
            return SubmitOutcome::from_error(&err);
        }
        info!(resource = %Q::RESOURCE, id = %id, "Row deleted");

        if self.page > 1 && self.rows.len() == 1 {
            self.page -= 1;
        }
        match self.fetch().await {
            Ok(()) => SubmitOutcome::Saved,
            Err(err) => SubmitOutcome::from_error(&err),
        }
    }

    /// Test hook: hold the delete flag as if a delete were in flight.
    #[cfg(test)]
    pub(crate) fn deleting_flag(&self) -> PendingFlag {
        self.deleting.clone()
    }
}
