//! Whole-word, case-insensitive phrase scanning.
//!
//! Matching runs over case-folded characters so byte offsets in the original
//! text stay valid. A single space in a phrase matches any run of
//! whitespace in the text.

/// One occurrence found in a scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    /// Index into the matcher's phrase list.
    pub phrase: usize,
    pub start: usize,
    pub end: usize,
}

/// Ordered set of phrases scanned longest-first.
#[derive(Debug, Clone, Default)]
pub struct PhraseMatcher {
    /// `(folded pattern, original index)`, longest pattern first.
    patterns: Vec<(Vec<char>, usize)>,
}

impl PhraseMatcher {
    pub fn new<'a>(phrases: impl IntoIterator<Item = &'a str>) -> Self {
        let mut patterns: Vec<(Vec<char>, usize)> = phrases
            .into_iter()
            .enumerate()
            .map(|(idx, phrase)| (fold_phrase(phrase), idx))
            .filter(|(pattern, _)| !pattern.is_empty())
            .collect();
        patterns.sort_by(|(a, ai), (b, bi)| b.len().cmp(&a.len()).then(a.cmp(b)).then(ai.cmp(bi)));
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Leftmost non-overlapping matches; at each position the longest phrase wins.
    pub fn find_all(&self, text: &str) -> Vec<PhraseMatch> {
        if self.patterns.is_empty() {
            return Vec::new();
        }
        let (folded, offsets) = fold_text(text);
        let mut found = Vec::new();
        let mut i = 0;
        while i < folded.len() {
            let hit = self
                .patterns
                .iter()
                .find_map(|(pattern, idx)| match_at(&folded, i, pattern).map(|end| (*idx, end)));
            if let Some((phrase, end)) = hit {
                found.push(PhraseMatch {
                    phrase,
                    start: offsets[i],
                    end: offsets[end],
                });
                i = end;
            } else {
                i += 1;
            }
        }
        found
    }
}

/// Whether `needle` occurs in `haystack` as a whole phrase.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    !PhraseMatcher::new([needle]).find_all(haystack).is_empty()
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn fold_phrase(phrase: &str) -> Vec<char> {
    let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized.chars().map(fold_char).collect()
}

/// Folded chars plus the byte offset of every char (and one past the end).
fn fold_text(text: &str) -> (Vec<char>, Vec<usize>) {
    let mut folded = Vec::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (offset, c) in text.char_indices() {
        folded.push(fold_char(c));
        offsets.push(offset);
    }
    offsets.push(text.len());
    (folded, offsets)
}

fn match_at(text: &[char], start: usize, pattern: &[char]) -> Option<usize> {
    let first = *pattern.first()?;
    let last = *pattern.last()?;
    if is_word_char(first) && start > 0 && is_word_char(text[start - 1]) {
        return None;
    }
    let mut i = start;
    for &p in pattern {
        if p == ' ' {
            if i >= text.len() || !text[i].is_whitespace() {
                return None;
            }
            while i < text.len() && text[i].is_whitespace() {
                i += 1;
            }
        } else {
            if i >= text.len() || text[i] != p {
                return None;
            }
            i += 1;
        }
    }
    if is_word_char(last) && i < text.len() && is_word_char(text[i]) {
        return None;
    }
    Some(i)
}
