use std::sync::Arc;

use regex::Regex;

use crate::error::ReplaceError;
use crate::function::Session;
use crate::regex_match::{capture_names, RegexMatch};

/// Outcome of [`replace_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    pub text: String,
    pub count: usize,
}

/// Replace every match of `regex` in `text` with what `session` returns for
/// it, left to right.
///
/// The first failing match aborts the whole operation; no partially
/// replaced text is returned.
pub fn replace_all(
    text: &str,
    regex: &Regex,
    session: &mut Session,
) -> Result<Replaced, ReplaceError> {
    let haystack: Arc<str> = Arc::from(text);
    let names = capture_names(regex);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for captures in regex.captures_iter(text) {
        let matched = RegexMatch::from_captures(&haystack, &captures, &names);
        let (start, end) = matched.span();
        out.push_str(&text[last..start]);
        out.push_str(&session.call(&matched)?);
        last = end;
        count += 1;
    }
    out.push_str(&text[last..]);

    Ok(Replaced { text: out, count })
}
