//! User management state shared by front ends.

pub mod listing;

pub use listing::{SortField, SortOrder, StatusFilter, UserFilters, UserListState, UserQuery};
