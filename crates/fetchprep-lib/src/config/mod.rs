mod loader;
mod model;

pub use loader::load_settings;
pub use model::Settings;
