use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use std::sync::Arc;

use crate::app_state::AppState;
use crate::error::{AppError, LocalizedError};
use crate::i18n::{Localizer, MessageArgs, SupportedLanguage};

/// Localizer bound to the request's language
#[derive(Clone)]
pub struct I18n {
    pub localizer: Arc<Localizer>,
    pub language: SupportedLanguage,
}

impl I18n {
    pub fn new(localizer: Arc<Localizer>, language: SupportedLanguage) -> Self {
        Self { localizer, language }
    }

    /// Language set by `language_middleware`, the default when it did not run.
    pub fn from_parts(parts: &Parts, localizer: Arc<Localizer>) -> Self {
        let language = parts
            .extensions
            .get::<SupportedLanguage>()
            .copied()
            .unwrap_or_default();
        Self::new(localizer, language)
    }

    pub fn get(&self, key: &str) -> String {
        self.localizer.get_string_for_language(&self.language, key, None)
    }

    pub fn get_with_args(&self, key: &str, args: &MessageArgs) -> String {
        self.localizer
            .get_string_for_language(&self.language, key, Some(args))
    }

    /// Attaches the localized message to an error on its way out of a handler.
    pub fn error(&self, error: impl Into<AppError>) -> LocalizedError {
        LocalizedError::new(error.into(), self)
    }
}

impl FromRequestParts<AppState> for I18n {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(I18n::from_parts(parts, state.localizer.clone()))
    }
}

/// Builds a `MessageArgs` map for Fluent placeables
#[macro_export]
macro_rules! i18n_args {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut args = $crate::i18n::MessageArgs::new();
        $(
            args.insert($key.to_string(), fluent_bundle::FluentValue::from($value));
        )*
        args
    }};
}
