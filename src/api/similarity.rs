//! String similarity for fuzzy field-name lookup
//!
//! Ratcliff/Obershelp "gestalt" matching: find the longest common block,
//! recurse on both sides of it, and score `2·M / (|a| + |b|)` where `M` is
//! the number of matched characters.

/// Similarity ratio between 0.0 and 1.0
pub fn ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();

    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a_chars, &b_chars);
    2.0 * matched as f64 / total as f64
}

/// Best candidate at or above `cutoff`. Ties keep the earliest candidate.
///
/// Each candidate is scored as `ratio(candidate, target)`; the ratio is not
/// symmetric, so the order matters near the cutoff.
pub fn closest_match<'a, I>(target: &str, candidates: I, cutoff: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;

    for candidate in candidates {
        let score = ratio(candidate, target);
        if score < cutoff {
            continue;
        }
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    best
}

/// Total size of the matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, a_lo, a_hi, b, b_lo, b_hi);
        if size == 0 {
            continue;
        }

        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common block within `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Returns `(start_in_a, start_in_b, size)`; among equally long blocks the one
/// starting earliest in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    a_lo: usize,
    a_hi: usize,
    b: &[char],
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let mut best = (a_lo, b_lo, 0);
    // run[j] = length of the common run ending at a[i - 1], b[j - 1]
    let mut previous = vec![0usize; b_hi - b_lo + 1];

    for i in a_lo..a_hi {
        let mut current = vec![0usize; b_hi - b_lo + 1];
        for j in b_lo..b_hi {
            if a[i] == b[j] {
                let run = previous[j - b_lo] + 1;
                current[j - b_lo + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        previous = current;
    }

    best
}
