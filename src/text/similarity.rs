//! Matching-block similarity ratio.
//!
//! The score is `2 * M / (len(a) + len(b))` where `M` is the number of
//! characters covered by matching blocks. Blocks are found the
//! Ratcliff/Obershelp way: take the longest common run, then recurse on
//! the unmatched text to its left and to its right. This approximates
//! the longest common subsequence while ignoring scattered coincidental
//! characters, which a true LCS would happily count.
//!
//! Runs shorter than [`MIN_BLOCK_LEN`] characters are not counted and
//! stop the recursion, so two unrelated sentences that happen to share
//! letters do not look similar. Compared with difflib's
//! `SequenceMatcher`, which counts single-character blocks, this scores
//! paraphrases lower on purpose: "Landlord must fix the roof." against
//! "Landlord shall repair the roof." drops from a partial match to
//! unverified.

use std::collections::HashMap;

/// Shortest common run that counts towards the ratio.
pub const MIN_BLOCK_LEN: usize = 2;

/// Similarity of two strings in `[0, 1]`, compared per code point.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    BlockMatcher::new(&a).ratio(&b)
}

/// Scores one fixed sequence against many candidates.
///
/// Holds scratch buffers so that scanning thousands of windows does not
/// allocate per window.
pub struct BlockMatcher<'a> {
    a: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
    scratch: RunScratch,
}

impl<'a> BlockMatcher<'a> {
    pub fn new(a: &'a [char]) -> Self {
        Self {
            a,
            b2j: HashMap::new(),
            scratch: RunScratch::default(),
        }
    }

    /// Ratio between the fixed sequence and `b`.
    pub fn ratio(&mut self, b: &[char]) -> f64 {
        let total = self.a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        ratio_of(self.matched_chars(b), total)
    }

    /// Cheap upper bound on [`ratio`](Self::ratio): shared characters
    /// regardless of order. Never smaller than the real ratio.
    pub fn quick_ratio(&self, b: &[char]) -> f64 {
        let total = self.a.len() + b.len();
        if total == 0 {
            return 1.0;
        }

        let mut available: HashMap<char, isize> = HashMap::new();
        for &c in b {
            *available.entry(c).or_insert(0) += 1;
        }

        let mut shared = 0;
        for c in self.a {
            let slot = available.entry(*c).or_insert(0);
            if *slot > 0 {
                shared += 1;
            }
            *slot -= 1;
        }

        ratio_of(shared, total)
    }

    /// Number of characters covered by matching blocks.
    fn matched_chars(&mut self, b: &[char]) -> usize {
        self.b2j.clear();
        for (j, &c) in b.iter().enumerate() {
            self.b2j.entry(c).or_default().push(j);
        }
        self.scratch.reset(b.len());

        let mut matched = 0;
        let mut queue = vec![(0, self.a.len(), 0, b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = longest_run(self.a, &self.b2j, &mut self.scratch, alo, ahi, blo, bhi);
            if k < MIN_BLOCK_LEN {
                continue;
            }

            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }
}

fn ratio_of(matched: usize, total: usize) -> f64 {
    2.0 * matched as f64 / total as f64
}

/// Per-row run lengths, reset sparsely between rows.
#[derive(Default)]
struct RunScratch {
    /// `lens[j + 1]` is the run length ending at `a[i - 1]`, `b[j]`
    lens: Vec<usize>,
    next_lens: Vec<usize>,
    touched: Vec<usize>,
    next_touched: Vec<usize>,
}

impl RunScratch {
    fn reset(&mut self, b_len: usize) {
        self.lens.clear();
        self.lens.resize(b_len + 1, 0);
        self.next_lens.clear();
        self.next_lens.resize(b_len + 1, 0);
        self.touched.clear();
        self.next_touched.clear();
    }
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(i, j, k)` with `a[i..i + k] == b[j..j + k]`. Ties go to the
/// run that ends first in `a`, then first in `b`, so results are
/// deterministic.
fn longest_run(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    scratch: &mut RunScratch,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

    for i in alo..ahi {
        scratch.next_touched.clear();

        if let Some(positions) = b2j.get(&a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }

                let k = scratch.lens[j] + 1;
                scratch.next_lens[j + 1] = k;
                scratch.next_touched.push(j + 1);

                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }

        for &t in &scratch.touched {
            scratch.lens[t] = 0;
        }
        for &t in &scratch.next_touched {
            scratch.lens[t] = scratch.next_lens[t];
            scratch.next_lens[t] = 0;
        }
        std::mem::swap(&mut scratch.touched, &mut scratch.next_touched);
    }

    for &t in &scratch.touched {
        scratch.lens[t] = 0;
    }
    scratch.touched.clear();

    (best_i, best_j, best_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_identical_is_one() {
        assert_eq!(similarity("tenant shall pay", "tenant shall pay"), 1.0);
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_both_empty_is_one() {
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_single_shared_characters_do_not_count() {
        // Only isolated letters in common
        assert_eq!(similarity("axbycz", "abc"), 0.0);
    }

    #[test]
    fn test_blocks_left_and_right_are_counted() {
        // "rent of $1" (10) then "000." (4) to its right
        let score = similarity("rent of $1000...", "rent of $1,000.");
        assert!((score - 2.0 * 14.0 / 31.0).abs() < 1e-9, "score = {}", score);
    }

    #[test]
    fn test_quick_ratio_is_upper_bound() {
        let a = chars("the landlord shall repair the roof");
        let mut matcher = BlockMatcher::new(&a);
        for b in [
            "the roof shall be repaired by landlord",
            "tenant pays rent",
            "",
            "the landlord shall repair the roof",
        ] {
            let b = chars(b);
            assert!(matcher.quick_ratio(&b) >= matcher.ratio(&b));
        }
    }

    #[test]
    fn test_matcher_reuse_is_stateless() {
        let a = chars("security deposit of $4,000");
        let mut matcher = BlockMatcher::new(&a);
        let first = matcher.ratio(&chars("a security deposit of $4,000."));
        let _ = matcher.ratio(&chars("unrelated words entirely"));
        let again = matcher.ratio(&chars("a security deposit of $4,000."));
        assert_eq!(first, again);
    }

    #[test]
    fn test_paraphrase_scores_below_partial() {
        // difflib's SequenceMatcher gives 44/58 here
        let score = similarity("landlord must fix the roof.", "landlord shall repair the roof.");
        assert!((score - 38.0 / 58.0).abs() < 1e-9);
        assert!(score < 0.70);
    }
}
