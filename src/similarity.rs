//! Ratcliff/Obershelp string similarity.

/// Similarity in `0.0..=1.0`: twice the matched characters over the total length.
///
/// Matches are found by taking the longest common block and recursing on the
/// unmatched text to either side of it. The larger of the two argument orders
/// is used so the score is symmetric.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_chars(&a, &b).max(matching_chars(&b, &a));
    2.0 * matched as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`, earliest on ties.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo + 1;
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; width];
    let mut cur = vec![0usize; width];
    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            cur[slot] = if a[i] == b[j] { prev[slot - 1] + 1 } else { 0 };
            let k = cur[slot];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_and_empty() {
        assert!(close(sequence_ratio("results", "results"), 1.0));
        assert!(close(sequence_ratio("", ""), 1.0));
        assert!(close(sequence_ratio("abc", ""), 0.0));
    }

    #[test]
    fn test_disjoint_strings_score_zero() {
        assert!(close(sequence_ratio("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_matches_reference_values() {
        assert!(close(sequence_ratio("abcd", "bcde"), 0.75));
        assert!(close(sequence_ratio("resuts", "results"), 12.0 / 13.0));
        assert!(close(sequence_ratio("##s", "results"), 0.2));
    }

    #[test]
    fn test_symmetric() {
        let pairs = [("tide", "diet"), ("results", "rests"), ("abxcd", "abcd"), ("qabxcd", "abycdf")];
        for (a, b) in pairs {
            assert!(close(sequence_ratio(a, b), sequence_ratio(b, a)), "{} / {}", a, b);
        }
    }

    #[test]
    fn test_counts_multiple_blocks() {
        // "ab" and "cd" both match around the inserted 'x'
        assert!(close(sequence_ratio("abxcd", "abcd"), 8.0 / 9.0));
    }
}
