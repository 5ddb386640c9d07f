//! Subsequence matching used to rank picker candidates.

/// Score for a query matched against one candidate. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FuzzyScore(pub i32);

fn is_boundary(prev: char) -> bool {
    prev.is_whitespace() || matches!(prev, '-' | '_' | '.' | '/' | ':' | '@')
}

/// Matches `query` as a case-insensitive subsequence of `candidate`.
///
/// Consecutive runs, word-boundary hits and an exact prefix are rewarded;
/// gaps and late first matches are penalized. An empty query matches
/// everything with score zero.
#[must_use]
pub fn fuzzy_score(query: &str, candidate: &str) -> Option<FuzzyScore> {
    let query: Vec<char> = query.to_lowercase().chars().collect();
    if query.is_empty() {
        return Some(FuzzyScore(0));
    }
    let text: Vec<char> = candidate.to_lowercase().chars().collect();

    let mut score = 0i32;
    let mut qi = 0usize;
    let mut last_hit: Option<usize> = None;
    let mut run = 0i32;

    for (ti, ch) in text.iter().enumerate() {
        if qi == query.len() {
            break;
        }
        if *ch != query[qi] {
            continue;
        }

        match last_hit {
            Some(prev) if prev + 1 == ti => {
                run += 1;
                score += 5 * run;
            }
            Some(prev) => {
                run = 0;
                score -= (ti - prev - 1).min(10) as i32;
            }
            None => {
                score -= ti.min(10) as i32;
            }
        }
        if ti == 0 || is_boundary(text[ti - 1]) {
            score += 10;
        }

        last_hit = Some(ti);
        qi += 1;
    }

    if qi < query.len() {
        return None;
    }
    if text.starts_with(&query) {
        score += 25;
    }
    Some(FuzzyScore(score))
}

/// Keeps items matching `query`, best first. Ties keep input order.
pub fn fuzzy_rank<T, F, S>(items: Vec<T>, query: &str, key: F) -> Vec<T>
where
    F: Fn(&T) -> S,
    S: AsRef<str>,
{
    let query = query.trim();
    if query.is_empty() {
        return items;
    }

    let mut scored: Vec<(FuzzyScore, usize, T)> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            fuzzy_score(query, key(&item).as_ref()).map(|score| (score, idx, item))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_beats_scattered() {
        let tight = fuzzy_score("rev", "review").expect("match");
        let loose = fuzzy_score("rev", "r_e_v").expect("match");
        assert!(tight > loose);
    }

    #[test]
    fn non_subsequence_does_not_match() {
        assert_eq!(fuzzy_score("zz", "review"), None);
    }

    #[test]
    fn rank_orders_prefix_first_and_drops_misses() {
        let items = vec!["compact", "clear", "model", "commit"];
        let ranked = fuzzy_rank(items, "com", |item| *item);
        assert_eq!(ranked.first(), Some(&"compact"));
        assert!(ranked.contains(&"commit"));
        assert!(!ranked.contains(&"clear"));
        assert!(!ranked.contains(&"model"));
    }

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let items = vec!["b", "a"];
        assert_eq!(fuzzy_rank(items, "  ", |item| *item), vec!["b", "a"]);
    }
}
