use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr, NativeCallContext, INT};

use crate::groups::apply_to_match_groups;
use crate::regex_match::RegexMatch;

fn opt_text(text: Option<&str>) -> Dynamic {
    text.map(|t| Dynamic::from(t.to_string()))
        .unwrap_or(Dynamic::UNIT)
}

fn span_array(span: Option<(usize, usize)>) -> Dynamic {
    match span {
        Some((start, end)) => {
            let array: Array = vec![Dynamic::from(start as INT), Dynamic::from(end as INT)];
            Dynamic::from(array)
        }
        None => Dynamic::UNIT,
    }
}

fn group_index(index: INT) -> Option<usize> {
    usize::try_from(index).ok()
}

pub fn register_functions(engine: &mut Engine) {
    engine.register_type_with_name::<RegexMatch>("Match");

    engine.register_get("text", |m: &mut RegexMatch| m.as_str().to_string());
    engine.register_get("start", |m: &mut RegexMatch| m.start() as INT);
    engine.register_get("end", |m: &mut RegexMatch| m.end() as INT);
    engine.register_get("group_count", |m: &mut RegexMatch| m.group_count() as INT);

    // m.group() is the whole match, m.group(i) a numbered group, m.group("name") a named one.
    // Groups that did not take part in the match are ().
    engine.register_fn("group", |m: &mut RegexMatch| m.as_str().to_string());
    engine.register_fn("group", |m: &mut RegexMatch, index: INT| {
        opt_text(group_index(index).and_then(|i| m.group(i)))
    });
    engine.register_fn("group", |m: &mut RegexMatch, name: &str| opt_text(m.named(name)));

    // Groups 1.. as an array
    engine.register_fn("groups", |m: &mut RegexMatch| -> Array {
        (1..=m.group_count()).map(|i| opt_text(m.group(i))).collect()
    });

    engine.register_fn("span", |m: &mut RegexMatch| span_array(Some(m.span())));
    engine.register_fn("span", |m: &mut RegexMatch, index: INT| {
        span_array(group_index(index).and_then(|i| m.group_span(i)))
    });

    engine.register_fn("to_string", |m: &mut RegexMatch| m.as_str().to_string());
    engine.register_fn("to_debug", |m: &mut RegexMatch| {
        format!("Match({:?} @ {}..{})", m.as_str(), m.start(), m.end())
    });

    // apply_to_groups(m, Fn("upper")): transform the groups, or the whole match without groups
    engine.register_fn(
        "apply_to_groups",
        |ctx: NativeCallContext, m: &mut RegexMatch, transform: FnPtr| -> Result<String, Box<EvalAltResult>> {
            apply_to_match_groups(m, |text| {
                let value: Dynamic = transform.call_within_context(&ctx, (text.to_string(),))?;
                if value.is_string() {
                    Ok(value.to_string())
                } else {
                    Err(format!(
                        "apply_to_groups: transform returned {} instead of a string",
                        value.type_name()
                    )
                    .into())
                }
            })
        },
    );
}
