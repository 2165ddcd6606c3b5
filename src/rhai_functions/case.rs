use rhai::Engine;

use crate::case;

/// Case transforms, callable directly (`upper(text)`), as methods
/// (`text.upper()`) and through `Fn("upper")` pointers.
pub fn register_functions(engine: &mut Engine) {
    engine.register_fn("upper", |text: &str| case::upper(text));
    engine.register_fn("lower", |text: &str| case::lower(text));
    engine.register_fn("capitalize", |text: &str| case::capitalize(text));
    engine.register_fn("titlecase", |text: &str| case::titlecase(text));
    engine.register_fn("swapcase", |text: &str| case::swapcase(text));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_functions_from_scripts() {
        let mut engine = Engine::new();
        register_functions(&mut engine);

        let result: String = engine.eval(r#"upper("abc")"#).unwrap();
        assert_eq!(result, "ABC");
        let result: String = engine.eval(r#""the old man and the sea".titlecase()"#).unwrap();
        assert_eq!(result, "The Old Man and the Sea");
        let result: String = engine.eval(r#"let f = Fn("swapcase"); f.call("aB")"#).unwrap();
        assert_eq!(result, "Ab");
    }
}
