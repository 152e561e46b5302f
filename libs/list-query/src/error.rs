use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors raised while an endpoint declares its list options.
///
/// Request handling itself never produces these: bad client input is ignored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("filter name must not be empty")]
    EmptyFilterName,

    #[error("invalid filter name '{0}': only ASCII letters, digits, '_' and '.' are allowed")]
    InvalidFilterName(String),

    #[error("'{0}' is a reserved query parameter and cannot be used as a filter")]
    ReservedFilterName(String),

    #[error("special filter '{0}' is already registered")]
    DuplicateSpecialFilter(String),

    #[error("invalid sort field '{0}'")]
    InvalidSortField(String),

    #[error("page size must be at least 1")]
    ZeroLimit,
}
