pub mod appointments;
pub mod schedule;

use std::fmt::Display;

use crate::error::{AppError, LocalizedError};
use crate::i18n::I18n;

/// Localized 400 for extractor rejections (malformed path, query or body).
pub(crate) fn bad_request(i18n: &I18n, rejection: impl Display) -> LocalizedError {
    i18n.error(AppError::BadRequest(rejection.to_string()))
}
