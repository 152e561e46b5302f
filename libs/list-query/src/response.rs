use crate::pagination::Pagination;
use serde::Serialize;

/// Uniform list envelope: `{success, count, pagination, data}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    /// Records in this page, not the total.
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(pagination: Pagination, data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }

    /// Transform every record, keeping the envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListResponse<U> {
        ListResponse::new(self.pagination, self.data.into_iter().map(f).collect())
    }
}
