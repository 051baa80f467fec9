pub mod fluent_loader;
pub mod helpers;
pub mod language;
pub mod localizer;

pub use fluent_loader::FluentLoader;
pub use helpers::I18n;
pub use language::SupportedLanguage;
pub use localizer::{Localizer, MessageArgs};

use anyhow::Result;

/// Loads the embedded Turkish (default) and English bundles.
pub fn init_i18n() -> Result<Localizer> {
    let mut loader = FluentLoader::new();
    for language in SupportedLanguage::all() {
        loader.load_locale(*language)?;
    }
    Ok(Localizer::new(loader))
}
