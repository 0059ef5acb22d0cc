use crate::config::{BoostTable, SearchConfig};
use crate::document::Document;
use crate::error::{Result, SearchError};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub type TermId = u32;
/// Insertion ordinal of a document within one index build.
pub type DocId = u32;
pub type FieldId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: FieldId,
    pub frequency: u32,
}

/// Term dictionary plus postings, built wholesale from one document sequence.
///
/// The dictionary is ordered so prefix expansion is a range scan. Postings of
/// each term are in ascending `doc_id` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub dictionary: BTreeMap<String, TermId>,
    pub postings: Vec<Vec<Posting>>,
    /// Interned field names; `Posting::field` indexes into this.
    pub fields: Vec<String>,
    /// Documents in insertion order; `DocId` indexes into this.
    pub docs: Vec<Document>,
    /// Boosts of the config the index was built with.
    pub boosts: BoostTable,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn term_postings(&self, term: &str) -> Option<&[Posting]> {
        let tid = *self.dictionary.get(term)?;
        self.postings.get(tid as usize).map(Vec::as_slice)
    }

    pub fn field_name(&self, field: FieldId) -> &str {
        self.fields.get(field as usize).map_or("", String::as_str)
    }

    pub fn doc(&self, doc_id: DocId) -> Option<&Document> {
        self.docs.get(doc_id as usize)
    }

    /// True when the index was built with boosts other than `config`'s.
    pub fn is_stale(&self, config: &SearchConfig) -> bool {
        self.boosts != config.boosts
    }
}

/// Build an inverted index from `documents`, in order.
///
/// Fails on an invalid config or a repeated document id; no partial index is
/// returned in either case.
pub fn build_index<I>(documents: I, config: &SearchConfig) -> Result<InvertedIndex>
where
    I: IntoIterator<Item = Document>,
{
    config.validate()?;

    let mut dictionary: BTreeMap<String, TermId> = BTreeMap::new();
    let mut postings: Vec<Vec<Posting>> = Vec::new();
    let mut field_ids: HashMap<String, FieldId> = HashMap::new();
    let mut fields: Vec<String> = Vec::new();
    let mut docs: Vec<Document> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for doc in documents {
        if !seen_ids.insert(doc.id.clone()) {
            tracing::warn!(id = %doc.id, "duplicate document id, aborting build");
            return Err(SearchError::DuplicateDocument { id: doc.id });
        }
        let doc_id = DocId::try_from(docs.len()).map_err(|_| SearchError::CapacityExceeded("documents"))?;

        for (name, content) in &doc.fields {
            let field = match field_ids.get(name) {
                Some(&f) => f,
                None => {
                    let f = FieldId::try_from(fields.len()).map_err(|_| SearchError::CapacityExceeded("fields"))?;
                    fields.push(name.clone());
                    field_ids.insert(name.clone(), f);
                    f
                }
            };

            let mut tf_counts: BTreeMap<String, u32> = BTreeMap::new();
            for term in tokenize(content) {
                *tf_counts.entry(term).or_insert(0) += 1;
            }
            for (term, frequency) in tf_counts {
                let tid = match dictionary.get(&term) {
                    Some(&tid) => tid,
                    None => {
                        let tid = TermId::try_from(postings.len()).map_err(|_| SearchError::CapacityExceeded("terms"))?;
                        postings.push(Vec::new());
                        dictionary.insert(term, tid);
                        tid
                    }
                };
                postings[tid as usize].push(Posting { doc_id, field, frequency });
            }
        }
        docs.push(doc);
    }

    let num_postings: usize = postings.iter().map(Vec::len).sum();
    tracing::info!(num_docs = docs.len(), num_terms = dictionary.len(), num_postings, "built inverted index");

    Ok(InvertedIndex { dictionary, postings, fields, docs, boosts: config.boosts.clone() })
}
