use std::convert::Infallible;

use crate::regex_match::RegexMatch;

/// Apply `transform` to the capture groups of `matched`, or to the whole
/// match when no group captured any text.
///
/// Non-empty groups are replaced in index order and everything between them
/// is copied through untouched. A group that starts inside an earlier,
/// already replaced group is skipped. Errors from `transform` are returned
/// unchanged.
pub fn apply_to_match_groups<F, E>(matched: &RegexMatch, mut transform: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<String, E>,
{
    let haystack = matched.haystack();
    let (start, end) = matched.span();
    let mut parts = String::with_capacity(end - start);
    let mut pos = start;
    let mut found_groups = false;

    for (group_start, group_end) in matched.group_spans().flatten() {
        if group_start == group_end || group_start < pos || group_end > end {
            continue;
        }
        parts.push_str(&haystack[pos..group_start]);
        parts.push_str(&transform(&haystack[group_start..group_end])?);
        pos = group_end;
        found_groups = true;
    }

    if !found_groups {
        return transform(matched.as_str());
    }
    parts.push_str(&haystack[pos..end]);
    Ok(parts)
}

/// Infallible form of [`apply_to_match_groups`] for plain text transforms.
pub fn map_match_groups(matched: &RegexMatch, transform: impl Fn(&str) -> String) -> String {
    match apply_to_match_groups::<_, Infallible>(matched, |text| Ok(transform(text))) {
        Ok(text) => text,
        Err(never) => match never {},
    }
}
