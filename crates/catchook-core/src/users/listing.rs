//! User listing state.
//!
//! The listing is one explicit value, `UserQuery { page, limit, filters }`.
//! Every input (search box, role/status filter, column sort, pager) turns
//! into a new query; the front end asks `pending_fetch()` whether the query
//! changed since the last fetch and spawns the request if so. Results that
//! arrive for a query that is no longer current are dropped.

use std::fmt;

use tracing::debug;

use crate::models::{Pagination, User, UserRole};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// Value of the `is_active` query parameter
    pub fn is_active(&self) -> Option<bool> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(true),
            StatusFilter::Inactive => Some(false),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Inactive,
            StatusFilter::Inactive => StatusFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All statuses",
            StatusFilter::Active => "Active",
            StatusFilter::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    FirstName,
    Email,
    Role,
    IsActive,
    #[default]
    CreatedAt,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::FirstName,
        SortField::Email,
        SortField::Role,
        SortField::IsActive,
        SortField::CreatedAt,
    ];

    pub fn as_param(&self) -> &'static str {
        match self {
            SortField::FirstName => "first_name",
            SortField::Email => "email",
            SortField::Role => "role",
            SortField::IsActive => "is_active",
            SortField::CreatedAt => "created_at",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortField::FirstName => "Name",
            SortField::Email => "Email",
            SortField::Role => "Role",
            SortField::IsActive => "Status",
            SortField::CreatedAt => "Created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggle(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserFilters {
    pub search: String,
    pub role: Option<UserRole>,
    pub status: StatusFilter,
    pub order_by: SortField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: UserFilters,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            filters: UserFilters::default(),
        }
    }
}

impl UserQuery {
    /// Query string pairs for `GET /users`. Unset filters are omitted.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        let search = self.filters.search.trim();
        if !search.is_empty() {
            params.push(("search".to_string(), search.to_string()));
        }
        if let Some(role) = self.filters.role {
            params.push(("role".to_string(), role.as_str().to_string()));
        }
        if let Some(active) = self.filters.status.is_active() {
            params.push(("is_active".to_string(), active.to_string()));
        }
        params.push(("order_by".to_string(), self.filters.order_by.as_param().to_string()));
        params.push(("order".to_string(), self.filters.order.as_param().to_string()));
        params
    }
}

impl fmt::Display for UserQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .to_params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", pairs.join("&"))
    }
}

/// Listing screen state: the current query plus the last page received.
#[derive(Debug, Clone, Default)]
pub struct UserListState {
    query: UserQuery,
    fetched: Option<UserQuery>,
    in_flight: Option<UserQuery>,
    pub users: Vec<User>,
    pub pagination: Option<Pagination>,
    pub error: Option<String>,
}

impl UserListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &UserQuery {
        &self.query
    }

    pub fn filters(&self) -> &UserFilters {
        &self.query.filters
    }

    /// Replace the filters. Any actual change sends the listing back to page 1.
    pub fn set_filters(&mut self, filters: UserFilters) {
        if filters != self.query.filters {
            self.query.filters = filters;
            self.query.page = 1;
        }
    }

    pub fn set_search(&mut self, search: &str) {
        let mut filters = self.query.filters.clone();
        filters.search = search.to_string();
        self.set_filters(filters);
    }

    pub fn set_role(&mut self, role: Option<UserRole>) {
        let mut filters = self.query.filters.clone();
        filters.role = role;
        self.set_filters(filters);
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        let mut filters = self.query.filters.clone();
        filters.status = status;
        self.set_filters(filters);
    }

    /// Sort by `field` and flip the order, whichever column was sorted before.
    pub fn toggle_sort(&mut self, field: SortField) {
        let mut filters = self.query.filters.clone();
        filters.order_by = field;
        filters.order = filters.order.toggle();
        self.set_filters(filters);
    }

    pub fn reset_filters(&mut self) {
        self.set_filters(UserFilters::default());
    }

    pub fn set_page(&mut self, page: u32) {
        let last = self.total_pages().max(1);
        self.query.page = page.clamp(1, last);
    }

    pub fn next_page(&mut self) {
        if self.pagination.map(|p| p.has_next).unwrap_or(false) {
            self.set_page(self.query.page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        if self.query.page > 1 {
            self.set_page(self.query.page - 1);
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.map(|p| p.total_pages).unwrap_or(1)
    }

    /// The query to fetch, if it differs from the last one fetched or requested.
    pub fn pending_fetch(&self) -> Option<UserQuery> {
        let current = Some(&self.query);
        if self.in_flight.as_ref() == current || self.fetched.as_ref() == current {
            return None;
        }
        Some(self.query.clone())
    }

    pub fn mark_fetching(&mut self, query: &UserQuery) {
        self.in_flight = Some(query.clone());
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Store a result. Returns false when the result belongs to a stale query.
    pub fn apply_result(&mut self, query: &UserQuery, result: Result<(Vec<User>, Pagination), String>) -> bool {
        if self.in_flight.as_ref() == Some(query) {
            self.in_flight = None;
        }
        if *query != self.query {
            debug!(stale = %query, current = %self.query, "Dropping stale user listing");
            return false;
        }
        self.fetched = Some(query.clone());
        match result {
            Ok((users, pagination)) => {
                self.users = users;
                self.pagination = Some(pagination);
                self.error = None;
            }
            Err(message) => {
                self.users.clear();
                self.pagination = None;
                self.error = Some(message);
            }
        }
        true
    }

    /// Force a re-fetch of the current query, e.g. after a write.
    pub fn invalidate(&mut self) {
        self.fetched = None;
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(page: u32, total_pages: u32) -> Pagination {
        Pagination {
            current_page: page,
            total_pages,
            total: u64::from(total_pages) * 10,
            limit: 10,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    fn loaded(state: &mut UserListState, total_pages: u32) {
        let query = state.pending_fetch().unwrap();
        state.mark_fetching(&query);
        assert!(state.apply_result(&query, Ok((Vec::new(), pagination(query.page, total_pages)))));
    }

    #[test]
    fn test_default_query_params() {
        let params = UserQuery::default().to_params();
        assert_eq!(
            params,
            vec![
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("order_by".to_string(), "created_at".to_string()),
                ("order".to_string(), "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_two_sorted_by_email() {
        let mut state = UserListState::new();
        state.toggle_sort(SortField::Email);
        loaded(&mut state, 5);
        state.set_page(2);

        assert_eq!(
            state.query().to_string(),
            "page=2&limit=10&order_by=email&order=asc"
        );
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut state = UserListState::new();
        loaded(&mut state, 5);
        state.set_page(3);
        assert_eq!(state.query().page, 3);

        state.set_role(Some(UserRole::Admin));
        assert_eq!(state.query().page, 1);

        state.set_page(2);
        state.set_status(StatusFilter::Inactive);
        assert_eq!(state.query().page, 1);

        state.set_page(2);
        state.set_search("ann");
        assert_eq!(state.query().page, 1);

        let params = state.query().to_params();
        assert!(params.contains(&("role".to_string(), "admin".to_string())));
        assert!(params.contains(&("is_active".to_string(), "false".to_string())));
        assert!(params.contains(&("search".to_string(), "ann".to_string())));
    }

    #[test]
    fn test_unchanged_filters_keep_page() {
        let mut state = UserListState::new();
        loaded(&mut state, 5);
        state.set_page(4);
        state.set_search("");
        state.set_role(None);
        assert_eq!(state.query().page, 4);
    }

    #[test]
    fn test_toggle_sort_flips_order() {
        let mut state = UserListState::new();
        assert_eq!(state.filters().order, SortOrder::Desc);
        state.toggle_sort(SortField::CreatedAt);
        assert_eq!(state.filters().order, SortOrder::Asc);
        state.toggle_sort(SortField::Role);
        assert_eq!(state.filters().order_by, SortField::Role);
        assert_eq!(state.filters().order, SortOrder::Desc);
    }

    #[test]
    fn test_pending_fetch_only_on_change() {
        let mut state = UserListState::new();
        let query = state.pending_fetch().unwrap();
        state.mark_fetching(&query);
        assert!(state.pending_fetch().is_none());
        assert!(state.is_loading());

        state.apply_result(&query, Ok((Vec::new(), pagination(1, 1))));
        assert!(state.pending_fetch().is_none());
        assert!(!state.is_loading());

        state.set_search("bob");
        assert!(state.pending_fetch().is_some());
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let mut state = UserListState::new();
        let old = state.pending_fetch().unwrap();
        state.mark_fetching(&old);

        state.set_search("zed");
        let new = state.pending_fetch().unwrap();
        state.mark_fetching(&new);

        assert!(!state.apply_result(&old, Err("boom".to_string())));
        assert!(state.error.is_none());
        assert!(state.is_loading());

        assert!(state.apply_result(&new, Ok((Vec::new(), pagination(1, 1)))));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_invalidate_refetches_same_query() {
        let mut state = UserListState::new();
        loaded(&mut state, 1);
        assert!(state.pending_fetch().is_none());
        state.invalidate();
        assert_eq!(state.pending_fetch(), Some(UserQuery::default()));
    }

    #[test]
    fn test_paging_bounds() {
        let mut state = UserListState::new();
        loaded(&mut state, 2);
        state.prev_page();
        assert_eq!(state.query().page, 1);
        state.set_page(9);
        assert_eq!(state.query().page, 2);
    }
}
