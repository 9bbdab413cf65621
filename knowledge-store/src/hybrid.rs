//! Merge of the semantic and keyword legs of a hybrid search.
//!
//! Ids found by both legs become [`MatchType::Hybrid`] with
//! `max(semantic, keyword) + HYBRID_BOOST`, which is strictly greater than
//! either input. Ordering: score desc, then semantic rank, then keyword rank.

use std::collections::HashMap;

use crate::record::{MatchType, SearchOptions, SearchResult};

/// Bonus added to hits found by both legs.
pub const HYBRID_BOOST: f32 = 0.15;

/// Threshold used for the vector leg; the caller threshold applies after merging.
pub const PERMISSIVE_SEMANTIC_THRESHOLD: f32 = 0.1;

struct Ranked {
    hit: SearchResult,
    semantic_rank: usize,
    keyword_rank: usize,
}

/// Merges both legs, applies `opts.score_threshold` and `opts.limit`.
pub fn merge_results(
    semantic: Vec<SearchResult>,
    keyword: Vec<SearchResult>,
    opts: SearchOptions,
) -> Vec<SearchResult> {
    let mut merged: Vec<Ranked> = Vec::with_capacity(semantic.len() + keyword.len());
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for (rank, mut hit) in semantic.into_iter().enumerate() {
        if by_id.contains_key(&hit.id) {
            continue;
        }
        hit.match_type = MatchType::Semantic;
        by_id.insert(hit.id.clone(), merged.len());
        merged.push(Ranked {
            hit,
            semantic_rank: rank,
            keyword_rank: usize::MAX,
        });
    }

    for (rank, hit) in keyword.into_iter().enumerate() {
        match by_id.get(&hit.id) {
            Some(&idx) => {
                let entry = &mut merged[idx];
                if entry.hit.match_type == MatchType::Hybrid {
                    continue;
                }
                entry.hit.score = entry.hit.score.max(hit.score) + HYBRID_BOOST;
                entry.hit.match_type = MatchType::Hybrid;
                entry.keyword_rank = rank;
            }
            None => {
                by_id.insert(hit.id.clone(), merged.len());
                merged.push(Ranked {
                    hit: SearchResult {
                        match_type: MatchType::Keyword,
                        ..hit
                    },
                    semantic_rank: usize::MAX,
                    keyword_rank: rank,
                });
            }
        }
    }

    merged.retain(|r| r.hit.score >= opts.score_threshold && r.hit.score >= 0.0);
    merged.sort_by(|a, b| {
        b.hit
            .score
            .total_cmp(&a.hit.score)
            .then(a.semantic_rank.cmp(&b.semantic_rank))
            .then(a.keyword_rank.cmp(&b.keyword_rank))
    });
    merged.truncate(opts.limit);
    merged.into_iter().map(|r| r.hit).collect()
}
