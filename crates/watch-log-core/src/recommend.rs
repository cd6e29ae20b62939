// Genre-affinity recommendations over metadata candidates

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use watch_log_models::{Candidate, WatchedItem};
use crate::stats::aggregate_in;

/// Weight of the catalog's vote average (0-10) relative to genre affinity
const VOTE_WEIGHT: f64 = 0.05;
/// Affinity multiplier for genres the user watched but never rated
const UNRATED_GENRE_WEIGHT: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub candidate: Candidate,
    pub score: f64,
    /// Candidate genres the user has history in
    pub matched_genres: Vec<String>,
}

/// Per-genre preference in `[0, 1]`, keyed by lowercased genre name
fn genre_affinity(collection: &[WatchedItem]) -> HashMap<String, f64> {
    let history: Vec<WatchedItem> = collection.iter().filter(|i| i.is_history()).cloned().collect();
    let summary = aggregate_in(&history, &chrono::Utc);
    let max_count = summary.by_genre.values().copied().max().unwrap_or(0);
    if max_count == 0 {
        return HashMap::new();
    }

    let mut rating_totals: HashMap<String, (u32, u32)> = HashMap::new();
    for item in &history {
        if let Some(rating) = item.star_rating() {
            for genre in item.genres() {
                let entry = rating_totals.entry(genre.to_lowercase()).or_insert((0, 0));
                entry.0 += u32::from(rating);
                entry.1 += 1;
            }
        }
    }

    let mut affinity: HashMap<String, f64> = HashMap::new();
    for (genre, count) in &summary.by_genre {
        let key = genre.to_lowercase();
        let weight = match rating_totals.get(&key) {
            Some((sum, n)) if *n > 0 => (*sum as f64 / *n as f64) / 5.0,
            _ => UNRATED_GENRE_WEIGHT,
        };
        let value = (*count as f64 / max_count as f64) * weight;
        // "Drama" and "drama" are the same genre here
        let slot = affinity.entry(key).or_insert(0.0);
        *slot = slot.max(value);
    }
    affinity
}

fn already_owned(collection: &[WatchedItem], candidate: &Candidate) -> bool {
    let title = candidate.title.to_lowercase();
    collection.iter().any(|item| {
        item.tmdb_id == Some(candidate.id)
            || item.id.as_number() == Some(candidate.id)
            || item.title.to_lowercase() == title
            || item
                .original_title
                .as_deref()
                .is_some_and(|t| t.to_lowercase() == title)
    })
}

/// Rank candidates the user does not already have, best first.
/// Equal scores keep candidate order.
pub fn recommend(
    collection: &[WatchedItem],
    candidates: &[Candidate],
    genre_names: &HashMap<u32, String>,
    limit: usize,
) -> Vec<Recommendation> {
    let affinity = genre_affinity(collection);
    let mut seen_ids = HashSet::new();

    let mut ranked: Vec<Recommendation> = candidates
        .iter()
        .filter(|c| seen_ids.insert(c.id))
        .filter(|c| !already_owned(collection, c))
        .map(|candidate| {
            let mut matched_genres = Vec::new();
            let mut score = 0.0;
            for genre_id in &candidate.genre_ids {
                let Some(name) = genre_names.get(genre_id) else {
                    continue;
                };
                if let Some(weight) = affinity.get(&name.to_lowercase()) {
                    score += weight;
                    matched_genres.push(name.clone());
                }
            }
            score += f64::from(candidate.vote_average.unwrap_or(0.0)) * VOTE_WEIGHT;
            Recommendation {
                candidate: candidate.clone(),
                score,
                matched_genres,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(limit);

    debug!(
        "recommend: candidates={}, affinity_genres={}, returned={}",
        candidates.len(),
        affinity.len(),
        ranked.len()
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use watch_log_models::{MediaKind, WatchStatus};

    fn create_candidate(id: u64, title: &str, genres: &[u32], vote: f32) -> Candidate {
        let mut candidate = Candidate::new(id, title);
        candidate.genre_ids = genres.to_vec();
        candidate.vote_average = Some(vote);
        candidate
    }

    fn genre_names() -> HashMap<u32, String> {
        HashMap::from([
            (18, "Drama".to_string()),
            (27, "Horror".to_string()),
            (35, "Comedy".to_string()),
        ])
    }

    fn collection() -> Vec<WatchedItem> {
        vec![
            WatchedItem::new("1", "Whiplash", MediaKind::Movie).with_genre("Drama").with_rating(5),
            WatchedItem::new("2", "Moonlight", MediaKind::Movie).with_genre("Drama").with_rating(4),
            WatchedItem::new("3", "Airplane!", MediaKind::Movie).with_genre("Comedy").with_rating(2),
            WatchedItem::new("4", "Hereditary", MediaKind::Movie)
                .with_genre("Horror")
                .with_status(WatchStatus::Watchlist),
        ]
    }

    #[test]
    fn test_prefers_liked_genres() {
        let candidates = vec![
            create_candidate(100, "Some Comedy", &[35], 7.0),
            create_candidate(101, "Some Drama", &[18], 7.0),
            create_candidate(102, "Some Horror", &[27], 7.0),
        ];
        let ranked = recommend(&collection(), &candidates, &genre_names(), 10);
        let titles: Vec<&str> = ranked.iter().map(|r| r.candidate.title.as_str()).collect();
        // Watchlist genres carry no affinity
        assert_eq!(titles, vec!["Some Drama", "Some Comedy", "Some Horror"]);
        assert_eq!(ranked[0].matched_genres, vec!["Drama".to_string()]);
        assert!(ranked[2].matched_genres.is_empty());
    }

    #[test]
    fn test_excludes_owned_and_duplicates() {
        let mut owned = WatchedItem::new("x", "Elsewhere", MediaKind::Movie);
        owned.tmdb_id = Some(200);
        let mut items = collection();
        items.push(owned);

        let candidates = vec![
            create_candidate(200, "Owned By Tmdb Id", &[18], 9.0),
            create_candidate(201, "WHIPLASH", &[18], 9.0),
            create_candidate(2, "Numeric Id Match", &[18], 9.0),
            create_candidate(202, "Fresh", &[18], 6.0),
            create_candidate(202, "Fresh", &[18], 6.0),
        ];
        let ranked = recommend(&items, &candidates, &genre_names(), 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.id, 202);
    }

    #[test]
    fn test_limit_and_stable_ties() {
        let candidates = vec![
            create_candidate(300, "First", &[], 5.0),
            create_candidate(301, "Second", &[], 5.0),
            create_candidate(302, "Third", &[], 5.0),
        ];
        let ranked = recommend(&[], &candidates, &genre_names(), 2);
        let ids: Vec<u64> = ranked.iter().map(|r| r.candidate.id).collect();
        assert_eq!(ids, vec![300, 301]);
    }
}
