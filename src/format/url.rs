//! URL output formatter

use crate::config::Config;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::search::SearchResult;

/// URL formatter - outputs one map URL per ranked carpark
pub struct UrlFormatter;

impl UrlFormatter {
    /// Format URLs with optional provider override
    pub fn format_with_provider(
        &self,
        result: &SearchResult,
        config: &Config,
        provider: Option<&str>,
    ) -> Result<String> {
        let mut output = String::new();
        for candidate in &result.carparks {
            let url = config.format_url(provider, candidate.carpark.lat, candidate.carpark.lng)?;
            output.push_str(&url);
            output.push('\n');
        }
        Ok(output)
    }
}

impl OutputFormatter for UrlFormatter {
    fn name(&self) -> &str {
        "url"
    }

    fn description(&self) -> &str {
        "Map URL per carpark"
    }

    fn format(&self, result: &SearchResult, config: &Config) -> Result<String> {
        self.format_with_provider(result, config, None)
    }
}
