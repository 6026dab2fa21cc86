//! Human-readable text output formatter

use crate::carpark::Candidate;
use crate::config::Config;
use crate::constants::rank::UNKNOWN_FEE_SCORE;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::search::rank::fee_score;
use crate::search::SearchResult;

/// Text formatter - outputs a numbered, ranked list
pub struct TextFormatter;

impl TextFormatter {
    fn format_candidate(rank: usize, candidate: &Candidate, result: &SearchResult) -> String {
        let carpark = &candidate.carpark;
        let mut line = format!("{:>3}. {} [{}]\n", rank, carpark.name, carpark.id);

        if !carpark.address.is_empty() {
            line.push_str(&format!("     {}\n", carpark.address));
        }

        let travel = match (candidate.distance_m, candidate.eta_s) {
            (Some(distance), Some(eta)) => {
                format!("{:.0}m, ~{:.0} min", distance, (eta / 60.0).ceil())
            }
            (Some(distance), None) => format!("{:.0}m", distance),
            _ => format!("{:.0}m straight-line", candidate.beeline_m),
        };
        line.push_str(&format!("     Distance: {}\n", travel));

        let lot_type = result.meta.lot_type;
        if let Some(lot) = candidate.lot_availability.get(lot_type) {
            line.push_str(&format!(
                "     Lots ({}): {}/{} available\n",
                lot_type, lot.available, lot.total
            ));
        }

        let fee = &carpark.fee;
        if fee.has_free_parking() {
            line.push_str(&format!(
                "     Free parking: {}\n",
                fee.free_parking.as_deref().unwrap_or_default()
            ));
        }
        if let Some(weekday) = &fee.weekday {
            line.push_str(&format!("     Weekday: {}\n", weekday));
        } else if !fee.has_free_parking() && fee_score(fee) >= UNKNOWN_FEE_SCORE {
            line.push_str("     Rates: unknown\n");
        }

        if let Some(height) = carpark.gantry_height_m {
            line.push_str(&format!("     Clearance: {:.2}m\n", height));
        }
        line
    }
}

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable ranked list"
    }

    fn format(&self, result: &SearchResult, _config: &Config) -> Result<String> {
        let mut output = String::new();

        // Header
        output.push_str(&format!("Carpark search ({})\n", result.id));
        match &result.center.address {
            Some(address) => output.push_str(&format!(
                "Center: {} ({:.6}, {:.6})\n",
                address, result.center.coords.lat, result.center.coords.lng
            )),
            None => output.push_str(&format!(
                "Center: ({:.6}, {:.6})\n",
                result.center.coords.lat, result.center.coords.lng
            )),
        }
        if let Some(radius) = result.meta.radius_m {
            output.push_str(&format!("Radius: {}m\n", radius));
        }
        output.push_str(&format!(
            "Mode: {}, live availability: {}\n\n",
            result.meta.mode,
            if result.meta.use_live_avail { "on" } else { "off" }
        ));

        if result.carparks.is_empty() {
            output.push_str("No carparks found.\n");
            return Ok(output);
        }

        output.push_str(&format!("Results ({}):\n", result.meta.count));
        for (i, candidate) in result.carparks.iter().enumerate() {
            output.push_str(&Self::format_candidate(i + 1, candidate, result));
        }

        Ok(output)
    }
}
