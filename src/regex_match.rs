use std::sync::Arc;

use regex::{Captures, Regex};

/// Owned view of a single regex match.
///
/// Holds the whole haystack behind an `Arc` so the match can be handed to
/// scripts (which need `'static + Send + Sync` values) without copying the
/// document for every match. Offsets are byte offsets into the haystack.
#[derive(Debug, Clone)]
pub struct RegexMatch {
    haystack: Arc<str>,
    // Index 0 is the overall match and is always present.
    spans: Vec<Option<(usize, usize)>>,
    names: Arc<[Option<String>]>,
}

impl RegexMatch {
    pub fn from_captures(
        haystack: &Arc<str>,
        captures: &Captures<'_>,
        names: &Arc<[Option<String>]>,
    ) -> Self {
        let spans = captures
            .iter()
            .map(|group| group.map(|m| (m.start(), m.end())))
            .collect();
        Self {
            haystack: Arc::clone(haystack),
            spans,
            names: Arc::clone(names),
        }
    }

    /// First match of `regex` in `text`, if any.
    pub fn first(regex: &Regex, text: &str) -> Option<Self> {
        let haystack: Arc<str> = Arc::from(text);
        let names = capture_names(regex);
        let captures = regex.captures(text)?;
        Some(Self::from_captures(&haystack, &captures, &names))
    }

    pub fn haystack(&self) -> &str {
        &self.haystack
    }

    pub fn span(&self) -> (usize, usize) {
        self.spans[0].unwrap_or((0, 0))
    }

    pub fn start(&self) -> usize {
        self.span().0
    }

    pub fn end(&self) -> usize {
        self.span().1
    }

    /// The whole matched text.
    pub fn as_str(&self) -> &str {
        let (start, end) = self.span();
        &self.haystack[start..end]
    }

    /// Number of capture groups in the pattern, not counting the whole match.
    pub fn group_count(&self) -> usize {
        self.spans.len().saturating_sub(1)
    }

    /// Text of group `index`; `None` when the group does not exist or did
    /// not participate in the match. Group 0 is the whole match.
    pub fn group(&self, index: usize) -> Option<&str> {
        let (start, end) = (*self.spans.get(index)?)?;
        Some(&self.haystack[start..end])
    }

    pub fn group_span(&self, index: usize) -> Option<(usize, usize)> {
        *self.spans.get(index)?
    }

    pub fn named(&self, name: &str) -> Option<&str> {
        let index = self
            .names
            .iter()
            .position(|candidate| candidate.as_deref() == Some(name))?;
        self.group(index)
    }

    /// Spans of groups 1.., in index order.
    pub fn group_spans(&self) -> impl Iterator<Item = Option<(usize, usize)>> + '_ {
        self.spans.iter().skip(1).copied()
    }
}

pub fn capture_names(regex: &Regex) -> Arc<[Option<String>]> {
    regex
        .capture_names()
        .map(|name| name.map(str::to_string))
        .collect()
}
