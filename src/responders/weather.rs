//! Weather lookups against an OpenWeatherMap-compatible API.

use async_trait::async_trait;
use chrono::DateTime;
use rand::seq::SliceRandom;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::ResponderError;

/// Days shown in a forecast.
const FORECAST_DAYS: usize = 5;

const COMPASS: [&str; 8] = [
    "North",
    "Northeast",
    "East",
    "Southeast",
    "South",
    "Southwest",
    "West",
    "Northwest",
];

const TRIVIA: &[&str] = &[
    "The highest temperature ever recorded on Earth was 56.7°C in Death Valley, California, in 1913.",
    "A single thunderstorm can release more energy than an atomic bomb.",
    "Snowflakes always have six sides, but no two are exactly alike.",
    "Raindrops are not tear-shaped; small ones are nearly spherical.",
    "Lightning strikes the Earth about 100 times every second.",
    "The coldest temperature ever recorded was -89.2°C at Vostok Station, Antarctica.",
    "Wind makes no sound until it blows against an object.",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Readings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Country {
    pub country: Option<String>,
}

/// `GET /weather` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub main: Readings,
    pub wind: Wind,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub sys: Country,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: Readings,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    /// Offset from UTC in seconds.
    #[serde(default)]
    pub timezone: i64,
}

/// `GET /forecast` payload (3-hour steps).
#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

fn description(conditions: &[Condition]) -> &str {
    conditions
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("unknown")
}

/// Weather data source.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current(&self, city: &str) -> Result<CurrentWeather, ResponderError>;

    async fn forecast(&self, city: &str) -> Result<Forecast, ResponderError>;
}

pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    lang: String,
}

impl OpenWeatherClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            lang: lang.into(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, city: &str) -> Result<T, ResponderError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ResponderError::Weather(e.without_url().to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ResponderError::CityNotFound(city.to_string())),
            status if !status.is_success() => {
                Err(ResponderError::Weather(format!("HTTP {}", status)))
            }
            _ => response
                .json::<T>()
                .await
                .map_err(|e| ResponderError::Weather(e.without_url().to_string())),
        }
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<CurrentWeather, ResponderError> {
        self.get("weather", city).await
    }

    async fn forecast(&self, city: &str) -> Result<Forecast, ResponderError> {
        self.get("forecast", city).await
    }
}

/// Nearest of the eight compass points for a wind bearing in degrees.
pub fn compass_direction(deg: f64) -> &'static str {
    let idx = ((deg / 45.0).round() as i64).rem_euclid(8) as usize;
    COMPASS[idx]
}

/// What to wear for a temperature (°C) and condition description.
pub fn clothing_advice(temp: f64, description: &str) -> String {
    let mut advice = if temp <= 5.0 {
        "Very cold: wear a heavy coat, scarf, gloves and a hat."
    } else if temp <= 10.0 {
        "Cold: a warm coat and a sweater are recommended."
    } else if temp <= 15.0 {
        "Cool: a light jacket or a sweater should be enough."
    } else if temp <= 20.0 {
        "Mild: long sleeves or a thin jacket will do."
    } else if temp <= 25.0 {
        "Warm: a t-shirt and light trousers are fine."
    } else {
        "Hot: wear light, breathable clothes and don't forget sunscreen."
    }
    .to_string();

    let desc = description.to_lowercase();
    if ["rain", "drizzle", "yağmur"].iter().any(|k| desc.contains(k)) {
        advice.push_str(" Take an umbrella or a raincoat.");
    }
    if ["snow", "kar"].iter().any(|k| desc.contains(k)) {
        advice.push_str(" Wear waterproof boots for the snow.");
    }
    if ["wind", "rüzgar"].iter().any(|k| desc.contains(k)) {
        advice.push_str(" It's windy, so a windproof layer will help.");
    }
    advice
}

pub fn random_trivia() -> &'static str {
    TRIVIA
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(TRIVIA[0])
}

pub fn format_current(weather: &CurrentWeather) -> String {
    let desc = description(&weather.weather);
    let place = match &weather.sys.country {
        Some(country) => format!("{}, {}", weather.name, country),
        None => weather.name.clone(),
    };
    format!(
        "🌤 Weather in {}\n\n\
         🌡 Temperature: {}°C (feels like {}°C)\n\
         💧 Humidity: {}%\n\
         💨 Wind: {} m/s from the {}\n\
         ☁️ Conditions: {}\n\n\
         👕 {}\n\n\
         💡 Did you know? {}",
        place,
        weather.main.temp.round(),
        weather.main.feels_like.round(),
        weather.main.humidity.round(),
        weather.wind.speed,
        compass_direction(weather.wind.deg),
        desc,
        clothing_advice(weather.main.temp, desc),
        random_trivia(),
    )
}

/// Local calendar-day label for a forecast timestamp.
fn day_label(dt: i64, offset_secs: i64) -> String {
    DateTime::from_timestamp(dt + offset_secs, 0)
        .map(|d| d.format("%a %d %b").to_string())
        .unwrap_or_else(|| dt.to_string())
}

/// One line per local day, first entry of each day, at most five days.
pub fn format_forecast(forecast: &Forecast) -> String {
    let mut seen = HashSet::new();
    let lines: Vec<String> = forecast
        .list
        .iter()
        .filter_map(|entry| {
            let label = day_label(entry.dt, forecast.city.timezone);
            seen.insert(label.clone()).then(|| {
                format!(
                    "📅 {}: {}°C, {}",
                    label,
                    entry.main.temp.round(),
                    description(&entry.weather)
                )
            })
        })
        .take(FORECAST_DAYS)
        .collect();

    format!(
        "5-day forecast for {}\n\n{}",
        forecast.city.name,
        lines.join("\n")
    )
}

/// Formats weather lookups; every failure becomes an apology.
pub struct WeatherResponder {
    api: Arc<dyn WeatherApi>,
}

impl WeatherResponder {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }

    pub async fn try_current_weather(&self, city: &str) -> Result<String, ResponderError> {
        let weather = self.api.current(city.trim()).await?;
        Ok(format_current(&weather))
    }

    pub async fn try_forecast(&self, city: &str) -> Result<String, ResponderError> {
        let forecast = self.api.forecast(city.trim()).await?;
        Ok(format_forecast(&forecast))
    }

    pub async fn current_weather(&self, city: &str) -> String {
        self.try_current_weather(city).await.unwrap_or_else(|e| {
            tracing::error!("Weather lookup for {} failed: {}", city, e);
            e.apology()
        })
    }

    pub async fn forecast(&self, city: &str) -> String {
        self.try_forecast(city).await.unwrap_or_else(|e| {
            tracing::error!("Forecast lookup for {} failed: {}", city, e);
            e.apology()
        })
    }
}
