//! Character-level string similarity.
//!
//! [`partial_ratio`] scores how well the shorter string aligns with its best
//! window inside the longer one, on a 0–100 scale. Matching blocks come from
//! the Ratcliff/Obershelp decomposition: take the longest common block, then
//! recurse into the pieces on either side of it.

use std::collections::HashMap;

/// A run of `len` equal characters at `a[a_start..]` and `b[b_start..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    len: usize,
}

struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b_positions: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b_positions.entry(*c).or_default().push(j);
        }
        Self { a, b, b_positions }
    }

    /// Longest block within `a[alo..ahi]` × `b[blo..bhi]`. Ties go to the
    /// block starting earliest in `a`, then earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let mut best = Block { a_start: alo, b_start: blo, len: 0 };
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_positions.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j.checked_sub(1).and_then(|p| run_ending_at.get(&p)).copied().unwrap_or(0) + 1;
                    next.insert(j, k);
                    if k > best.len {
                        best = Block { a_start: i + 1 - k, b_start: j + 1 - k, len: k };
                    }
                }
            }
            run_ending_at = next;
        }
        best
    }

    /// All matching blocks in ascending order, adjacent blocks merged, ending
    /// with the zero-length sentinel `(a.len(), b.len(), 0)`.
    fn matching_blocks(&self) -> Vec<Block> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut found = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let m = self.longest_match(alo, ahi, blo, bhi);
            if m.len == 0 {
                continue;
            }
            found.push(m);
            if alo < m.a_start && blo < m.b_start {
                pending.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.len < ahi && m.b_start + m.len < bhi {
                pending.push((m.a_start + m.len, ahi, m.b_start + m.len, bhi));
            }
        }
        found.sort_by_key(|b| (b.a_start, b.b_start));

        let mut merged: Vec<Block> = Vec::with_capacity(found.len() + 1);
        for block in found {
            match merged.last_mut() {
                Some(prev) if prev.a_start + prev.len == block.a_start && prev.b_start + prev.len == block.b_start => {
                    prev.len += block.len;
                }
                _ => merged.push(block),
            }
        }
        merged.push(Block { a_start: self.a.len(), b_start: self.b.len(), len: 0 });
        merged
    }

    fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|b| b.len).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Sequence similarity `2·M / T` in `[0, 1]`, where `M` is the number of
/// matched characters and `T` the combined length. Two empty strings score 1.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    Matcher::new(&a, &b).ratio()
}

/// Best-aligned substring similarity, 0–100.
///
/// Equal strings score 100, an empty side scores 0. Otherwise every matching
/// block anchors a window of the longer string as long as the shorter one, and
/// the best window ratio wins.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = 0.0f64;
    for block in Matcher::new(shorter, longer).matching_blocks() {
        let start = block.b_start.saturating_sub(block.a_start);
        let end = (start + shorter.len()).min(longer.len());
        let r = Matcher::new(shorter, &longer[start..end]).ratio();
        if r > 0.995 {
            return 100;
        }
        best = best.max(r);
    }
    (100.0 * best).round_ties_even() as u8
}
