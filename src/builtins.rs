use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::case;
use crate::error::ReplaceError;
use crate::function::{CallArgs, NativeTransform};
use crate::groups::map_match_groups;

/// A native function bundled with the crate.
pub struct Builtin {
    pub name: &'static str,
    pub transform: NativeTransform,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "Upper-case text",
        transform: replace_uppercase,
    },
    Builtin {
        name: "Lower-case text",
        transform: replace_lowercase,
    },
    Builtin {
        name: "Capitalize text",
        transform: replace_capitalize,
    },
    Builtin {
        name: "Title-case text",
        transform: replace_titlecase,
    },
    Builtin {
        name: "Swap the case of text",
        transform: replace_swapcase,
    },
];

// Display/editing source for each built-in, keyed by name.
static CATALOG: Lazy<HashMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../resources/builtin-functions.json"))
        .expect("invalid bundled builtin-functions.json")
});

/// Illustrative script source of the built-in called `name`.
pub fn catalog_source(name: &str) -> Option<&'static str> {
    CATALOG.get(name).map(String::as_str)
}

/// Make matched text upper case. With groups in the pattern only the
/// group text changes.
fn replace_uppercase(args: &CallArgs<'_>) -> Result<String, ReplaceError> {
    Ok(map_match_groups(args.matched, case::upper))
}

fn replace_lowercase(args: &CallArgs<'_>) -> Result<String, ReplaceError> {
    Ok(map_match_groups(args.matched, case::lower))
}

fn replace_capitalize(args: &CallArgs<'_>) -> Result<String, ReplaceError> {
    Ok(map_match_groups(args.matched, case::capitalize))
}

fn replace_titlecase(args: &CallArgs<'_>) -> Result<String, ReplaceError> {
    Ok(map_match_groups(args.matched, case::titlecase))
}

fn replace_swapcase(args: &CallArgs<'_>) -> Result<String, ReplaceError> {
    Ok(map_match_groups(args.matched, case::swapcase))
}
