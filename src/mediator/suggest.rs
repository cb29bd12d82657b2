//! "Did you mean" suggestions for empty or low-confidence queries.

/// Edit distance at or below which a non-containing candidate qualifies.
pub const MAX_EDIT_DISTANCE: usize = 3;

/// Closest names from `pool`, best first. Candidates equal to the query
/// (ignoring case) are skipped.
pub fn suggest(query: &str, tokens: &[String], pool: &[String], limit: usize) -> Vec<String> {
    let query_lower = query.trim().to_lowercase();
    let mut scored: Vec<(usize, &String)> = Vec::new();

    for candidate in pool {
        let cand = candidate.to_lowercase();
        if cand == query_lower {
            continue;
        }
        let best = tokens
            .iter()
            .map(|t| t.as_str())
            .chain(std::iter::once(query_lower.as_str()))
            .filter(|t| !t.is_empty())
            .filter_map(|t| candidate_score(t, &cand))
            .min();
        if let Some(s) = best {
            scored.push((s, candidate));
        }
    }

    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut out: Vec<String> = Vec::new();
    for (_, name) in scored {
        if !out.iter().any(|o| o.eq_ignore_ascii_case(name)) {
            out.push(name.clone());
        }
        if out.len() >= limit {
            break;
        }
    }
    out
}

/// `min(length delta, edit distance)` when either containment holds or the
/// edit distance is within [`MAX_EDIT_DISTANCE`].
fn candidate_score(token: &str, candidate: &str) -> Option<usize> {
    let contains = candidate.contains(token) || token.contains(candidate);
    let distance = levenshtein(token, candidate);
    if contains {
        let delta = token.chars().count().abs_diff(candidate.chars().count());
        Some(delta.min(distance))
    } else if distance <= MAX_EDIT_DISTANCE {
        Some(distance)
    } else {
        None
    }
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
