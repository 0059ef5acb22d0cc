//! In-memory full-text search for documentation sites.
//!
//! Documents are collected from the site navigation, tokenized per field and
//! indexed into an [`InvertedIndex`]. Queries expand each term by exact,
//! prefix and fuzzy matching and rank documents by boosted term frequency.

pub mod collect;
pub mod config;
pub mod document;
pub mod error;
pub mod fuzzy;
pub mod index;
pub mod persist;
pub mod query;
pub mod site;
pub mod store;
pub mod tokenizer;

pub use config::{BoostTable, CombineWith, SearchConfig, TieBreak};
pub use document::Document;
pub use error::{Result, SearchError};
pub use index::{build_index, DocId, FieldId, InvertedIndex, Posting, TermId};
pub use query::{search, MatchKind, QueryEngine, RankedResult, TermMatch};
pub use site::{LocaleConfig, NavNode, PageRef, SiteConfig, ThemeConfig};
pub use store::IndexStore;
