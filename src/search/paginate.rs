//! Ranker & Paginator

use serde::Serialize;

/// Page counters derived from `total_found`, `limit` and `skip`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(total_found: usize, limit: usize, skip: usize) -> Self {
        let limit = limit.max(1);
        Self {
            page: (skip / limit).saturating_add(1),
            total_pages: total_found.div_ceil(limit),
            has_next: skip.saturating_add(limit) < total_found,
            has_prev: skip > 0,
        }
    }
}

/// Keep items scoring at least `min_score`, order best first and cut the
/// `[skip, skip + limit)` window.
///
/// The sort is stable, so equal scores keep their incoming (retrieval)
/// order. Returns the page and the filtered count before slicing.
pub fn rank_and_page<T, F>(
    items: Vec<T>,
    score: F,
    min_score: f64,
    limit: usize,
    skip: usize,
) -> (Vec<T>, usize)
where
    F: Fn(&T) -> f64,
{
    let mut kept: Vec<T> = items.into_iter().filter(|i| score(i) >= min_score).collect();
    kept.sort_by(|a, b| score(b).total_cmp(&score(a)));

    let total_found = kept.len();
    let page = kept.into_iter().skip(skip).take(limit).collect();
    (page, total_found)
}
