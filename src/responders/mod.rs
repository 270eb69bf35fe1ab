//! Remote-backed responders. Failures stop here and become apology text.

use thiserror::Error;

use crate::providers::ProviderError;
use crate::replies;

pub mod ai;
pub mod weather;

pub use ai::AiResponder;
pub use weather::{OpenWeatherClient, WeatherApi, WeatherResponder};

#[derive(Error, Debug)]
pub enum ResponderError {
    #[error("{0} API key missing")]
    NotConfigured(String),

    #[error("Empty response after retry")]
    Empty,

    #[error("Provider error: {0}")]
    Provider(ProviderError),

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Weather service error: {0}")]
    Weather(String),
}

impl From<ProviderError> for ResponderError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotConfigured(name) => ResponderError::NotConfigured(name),
            other => ResponderError::Provider(other),
        }
    }
}

impl ResponderError {
    /// User-facing text for this failure.
    pub fn apology(&self) -> String {
        match self {
            ResponderError::NotConfigured(_) => {
                "Üzgünüm, AI servisi için API anahtarı eksik. Lütfen bot yöneticisine başvurun."
                    .to_string()
            }
            ResponderError::Empty | ResponderError::Provider(_) => replies::ai_fallback(),
            ResponderError::CityNotFound(city) => format!(
                "Sorry, I couldn't find a city called \"{}\". Please check the spelling and try again.",
                city
            ),
            ResponderError::Weather(_) => {
                "Sorry, weather information is unavailable right now. Please try again later."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_not_configured_maps_through() {
        let err: ResponderError = ProviderError::NotConfigured("gemini".to_string()).into();
        assert!(matches!(err, ResponderError::NotConfigured(ref n) if n == "gemini"));
        assert!(err.apology().contains("API anahtarı eksik"));
    }

    #[test]
    fn test_apologies() {
        assert!(ResponderError::Empty.apology().ends_with("(Gemini error)"));
        assert!(ResponderError::CityNotFound("Atlantis".to_string())
            .apology()
            .contains("\"Atlantis\""));
        assert!(ResponderError::Weather("boom".to_string())
            .apology()
            .starts_with("Sorry"));
    }
}
