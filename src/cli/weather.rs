//! Weather command handler

use crate::cli::init_logging;
use crate::config::Config;
use crate::error::Result;
use crate::geo::Coordinates;
use crate::provider::Providers;
use crate::weather::{Forecast, Forecasts, WeatherReport};
use clap::Args;

/// Weather command arguments
#[derive(Args)]
pub struct WeatherArgs {
    /// Latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Use deterministic offline providers
    #[arg(long)]
    pub mock: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the weather command
pub async fn run(args: WeatherArgs) -> Result<()> {
    init_logging("warn");

    let mut config = Config::load()?;
    if args.mock {
        config.providers.mock = true;
    }

    let at = Coordinates::new(args.lat, args.lng);
    at.validate()?;

    let providers = Providers::from_config(&config)?;
    let forecast = WeatherReport::new(providers.weather).forecast(at).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        println!("{}", render(forecast.as_ref()));
    }
    Ok(())
}

fn render(forecast: Option<&Forecasts>) -> String {
    let Some(forecast) = forecast else {
        return "No forecast available".to_string();
    };

    let line = |label: &str, f: &Forecast| {
        format!(
            "{:<9} {} ({}, until {})",
            label,
            f.condition,
            f.area,
            f.valid_to.format("%Y-%m-%d %H:%M UTC")
        )
    };

    [
        forecast.two_hour.as_ref().map(|f| line("2 hours:", f)),
        forecast.twenty_four_hour.as_ref().map(|f| line("24 hours:", f)),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render() {
        let until = Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0).unwrap();
        let forecasts = Forecasts {
            two_hour: Some(Forecast {
                area: "Bedok".to_string(),
                updated_at: until,
                valid_from: until,
                valid_to: until,
                condition: "Thundery Showers".to_string(),
            }),
            twenty_four_hour: None,
        };

        assert_eq!(
            render(Some(&forecasts)),
            "2 hours:  Thundery Showers (Bedok, until 2024-05-01 04:00 UTC)"
        );
        assert_eq!(render(None), "No forecast available");
    }
}
