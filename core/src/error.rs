use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    /// Invalid fuzziness, boost, limit or weight. Raised at construction, never mid-query.
    #[error("invalid search configuration: {0}")]
    Configuration(String),

    #[error("duplicate document id: {id}")]
    DuplicateDocument { id: String },

    /// More distinct fields, terms or documents than the id types can address.
    #[error("index capacity exceeded: too many {0}")]
    CapacityExceeded(&'static str),

    #[error("an index build is already running on this store")]
    BuildInProgress,
}

pub type Result<T> = std::result::Result<T, SearchError>;
