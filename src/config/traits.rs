use crate::error::SweetspotError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), SweetspotError>;
}

/// Shorthand for a `Configuration` error scoped to a section.
pub(crate) fn invalid<S: ConfigSection>(message: impl Into<String>) -> SweetspotError {
    SweetspotError::Configuration(format!("[{}] {}", S::section_name(), message.into()))
}
