//! Query expansion and ranking over a finished [`InvertedIndex`].

use crate::config::{CombineWith, SearchConfig, TieBreak};
use crate::error::Result;
use crate::fuzzy::bounded_levenshtein;
use crate::index::{DocId, InvertedIndex, TermId};
use crate::tokenizer::tokenize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Bound;

/// How an indexed term was reached from a query term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Exact,
    Prefix,
    Fuzzy { distance: usize, max_distance: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    pub term: String,
    pub term_id: TermId,
    pub kind: MatchKind,
    /// Multiplier applied to every posting of this term.
    pub quality: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub doc_id: DocId,
    /// External document id.
    pub id: String,
    pub score: f32,
}

/// Stateless query engine. The config is validated once, in [`QueryEngine::new`].
#[derive(Debug, Clone)]
pub struct QueryEngine {
    config: SearchConfig,
}

impl QueryEngine {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SearchConfig { &self.config }

    /// Edit-distance budget for a query term: `floor(len * fuzziness)`,
    /// at least 1 for terms longer than two characters, capped at `max_fuzzy`.
    pub fn max_distance(&self, term: &str) -> usize {
        let f = self.config.fuzziness;
        if f <= 0.0 {
            return 0;
        }
        let len = term.chars().count();
        let mut budget = (len as f32 * f).floor() as usize;
        if budget == 0 && len > 2 {
            budget = 1;
        }
        budget.min(self.config.max_fuzzy)
    }

    /// Candidate index terms for one (already normalized) query term, in
    /// dictionary order. A term reachable several ways keeps its best quality.
    pub fn expand(&self, index: &InvertedIndex, term: &str) -> Vec<TermMatch> {
        let mut found: BTreeMap<&str, TermMatch> = BTreeMap::new();

        if let Some((t, &tid)) = index.dictionary.get_key_value(term) {
            offer(&mut found, t, tid, MatchKind::Exact, 1.0);
        }

        if self.config.prefix {
            let range = index.dictionary.range::<str, _>((Bound::Excluded(term), Bound::Unbounded));
            for (t, &tid) in range.take_while(|(t, _)| t.starts_with(term)) {
                offer(&mut found, t, tid, MatchKind::Prefix, self.config.prefix_weight);
            }
        }

        let max_distance = self.max_distance(term);
        if max_distance > 0 {
            for (t, &tid) in &index.dictionary {
                let Some(distance) = bounded_levenshtein(term, t, max_distance) else { continue };
                if distance == 0 { continue; }
                // a match at exactly max_distance still scores
                let quality = self.config.fuzzy_weight * (1.0 - distance as f32 / (max_distance + 1) as f32);
                offer(&mut found, t, tid, MatchKind::Fuzzy { distance, max_distance }, quality);
            }
        }

        found.into_values().collect()
    }

    /// All matching documents, best first. Not truncated.
    pub fn rank(&self, index: &InvertedIndex, query: &str) -> Vec<RankedResult> {
        let terms = tokenize(query);
        if terms.is_empty() || index.is_empty() {
            return Vec::new();
        }

        let n = index.num_docs();
        let field_boosts: Vec<f32> = index.fields.iter().map(|f| self.config.boosts.weight(f)).collect();
        let mut scores = vec![0.0f32; n];
        let mut terms_hit = vec![0usize; n];
        let mut last_hit = vec![usize::MAX; n];

        for (i, term) in terms.iter().enumerate() {
            let candidates = self.expand(index, term);
            if candidates.is_empty() {
                tracing::debug!(term = %term, "query term matched nothing");
                continue;
            }
            for cand in &candidates {
                for p in &index.postings[cand.term_id as usize] {
                    let boost = field_boosts.get(p.field as usize).copied().unwrap_or(0.0);
                    let partial = p.frequency as f32 * boost * cand.quality;
                    if partial <= 0.0 { continue; }
                    let d = p.doc_id as usize;
                    scores[d] += partial;
                    if last_hit[d] != i {
                        last_hit[d] = i;
                        terms_hit[d] += 1;
                    }
                }
            }
        }

        let mut results: Vec<RankedResult> = scores
            .iter()
            .enumerate()
            .filter(|&(d, &score)| {
                score > 0.0 && (self.config.combine_with == CombineWith::Or || terms_hit[d] == terms.len())
            })
            .map(|(d, &score)| RankedResult { doc_id: d as DocId, id: index.docs[d].id.clone(), score })
            .collect();

        match self.config.tie_break {
            TieBreak::InsertionOrder => {
                results.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
            }
        }
        tracing::debug!(query, terms = terms.len(), hits = results.len(), "ranked query");
        results
    }

    /// Best matches, truncated to the configured result limit.
    pub fn search(&self, index: &InvertedIndex, query: &str) -> Vec<RankedResult> {
        let mut results = self.rank(index, query);
        results.truncate(self.config.result_limit);
        results
    }
}

fn offer<'a>(found: &mut BTreeMap<&'a str, TermMatch>, term: &'a str, term_id: TermId, kind: MatchKind, quality: f32) {
    if quality <= 0.0 {
        return;
    }
    if found.get(term).map_or(true, |m| m.quality < quality) {
        found.insert(term, TermMatch { term: term.to_string(), term_id, kind, quality });
    }
}

/// One-shot search. Validates `config` before touching the index.
pub fn search(index: &InvertedIndex, query: &str, config: &SearchConfig) -> Result<Vec<RankedResult>> {
    Ok(QueryEngine::new(config.clone())?.search(index, query))
}
