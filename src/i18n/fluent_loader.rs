use anyhow::{Context, Result};
use fluent_bundle::{concurrent::FluentBundle, FluentResource};
use std::collections::HashMap;

use crate::i18n::language::SupportedLanguage;

pub type Bundle = FluentBundle<FluentResource>;

const TURKISH_FTL: &str = include_str!("../../locales/tr/booking.ftl");
const ENGLISH_FTL: &str = include_str!("../../locales/en/booking.ftl");

/// Fluent bundles for every supported language, built from the embedded resources
pub struct FluentLoader {
    bundles: HashMap<SupportedLanguage, Bundle>,
}

impl FluentLoader {
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    pub fn load_locale(&mut self, language: SupportedLanguage) -> Result<()> {
        let source = match language {
            SupportedLanguage::Turkish => TURKISH_FTL,
            SupportedLanguage::English => ENGLISH_FTL,
        };
        self.load_source(language, source)
    }

    /// Builds the bundle for `language` from FTL text, replacing any previous one.
    pub fn load_source(&mut self, language: SupportedLanguage, source: &str) -> Result<()> {
        let lang_id = language
            .lang_id()
            .with_context(|| format!("Invalid language identifier for {}", language))?;
        let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
        // Messages end up in JSON bodies, not bidi text.
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
            anyhow::anyhow!("Failed to parse FTL for {}: {:?}", language, errors)
        })?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Failed to add resource to bundle: {:?}", errors))?;

        tracing::debug!(locale = language.code(), "Loaded Fluent bundle");
        self.bundles.insert(language, bundle);
        Ok(())
    }

    pub fn get_bundle(&self, language: &SupportedLanguage) -> Option<&Bundle> {
        self.bundles.get(language)
    }
}

impl Default for FluentLoader {
    fn default() -> Self {
        Self::new()
    }
}
