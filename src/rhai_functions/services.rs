use rhai::{Array, Dynamic, Engine, EvalAltResult, INT};

use crate::function::{DictionaryHandle, FunctionTable};
use crate::regex_match::RegexMatch;

fn to_array(words: Vec<String>) -> Array {
    words.into_iter().map(Dynamic::from).collect()
}

pub fn register_functions(engine: &mut Engine) {
    // dictionaries.recognized(word[, locale]) / dictionaries.suggestions(word[, locale])
    engine.register_type_with_name::<DictionaryHandle>("Dictionaries");
    engine.register_fn("recognized", |d: &mut DictionaryHandle, word: &str| {
        d.recognized(word, None)
    });
    engine.register_fn(
        "recognized",
        |d: &mut DictionaryHandle, word: &str, locale: &str| d.recognized(word, Some(locale)),
    );
    engine.register_fn("suggestions", |d: &mut DictionaryHandle, word: &str| {
        to_array(d.suggestions(word, None))
    });
    engine.register_fn(
        "suggestions",
        |d: &mut DictionaryHandle, word: &str, locale: &str| {
            to_array(d.suggestions(word, Some(locale)))
        },
    );

    // functions.invoke(name, m) runs another function on the same match
    engine.register_type_with_name::<FunctionTable>("Functions");
    engine.register_fn(
        "invoke",
        |table: &mut FunctionTable, name: &str, m: RegexMatch| -> Result<String, Box<EvalAltResult>> {
            table.invoke(name, &m).map_err(|e| e.to_string().into())
        },
    );
    engine.register_fn("names", |table: &mut FunctionTable| -> Array {
        table.names().map(|name| Dynamic::from(name.to_string())).collect()
    });
    // `"name" in functions`
    engine.register_fn("contains", |table: &mut FunctionTable, name: &str| {
        table.contains(name)
    });
    engine.register_fn("len", |table: &mut FunctionTable| table.len() as INT);
}
