use rhai::Engine;

pub mod case;
pub mod matches;
pub mod services;

pub fn register_all_functions(engine: &mut Engine) {
    matches::register_functions(engine);
    case::register_functions(engine);
    services::register_functions(engine);
}
