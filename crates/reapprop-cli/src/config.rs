use anyhow::{Context, Result};
use reapprop::ReadOptions;
use reapprop::parse::ParseOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigInput {
    pub enacted: Option<PathBuf>,
    pub executive: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOutput {
    pub dir: Option<PathBuf>,
    /// Number of largest discrepancies listed on the console.
    pub top: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(try_from = "RawConfigParser")]
pub struct ConfigParser(pub ReadOptions);

impl Default for ConfigParser {
    fn default() -> Self {
        ConfigParser(ReadOptions::default())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigParser {
    min_year: Option<i32>,
    max_year: Option<i32>,
    context_window: Option<usize>,
    progress_interval: Option<u32>,
    enacted_cover_year: Option<i32>,
    executive_cover_year: Option<i32>,
    #[serde(default)]
    agency_exclusions: Vec<String>,
}

impl TryFrom<RawConfigParser> for ConfigParser {
    type Error = String;

    fn try_from(raw: RawConfigParser) -> Result<Self, Self::Error> {
        let defaults = ReadOptions::default();

        let min_year = raw.min_year.unwrap_or(*defaults.plausible_years.start());
        let max_year = raw.max_year.unwrap_or(*defaults.plausible_years.end());
        if min_year > max_year {
            return Err(format!(
                "min_year ({min_year}) must not be greater than max_year ({max_year})"
            ));
        }

        let agency_exclusions = raw
            .agency_exclusions
            .into_iter()
            .map(|word| word.trim().to_uppercase())
            .filter(|word| !word.is_empty())
            .collect();

        Ok(ConfigParser(ReadOptions {
            parse: ParseOptions {
                context_window: raw
                    .context_window
                    .unwrap_or(defaults.parse.context_window),
                agency_exclusions,
            },
            plausible_years: min_year..=max_year,
            enacted_cover_year: raw.enacted_cover_year,
            executive_cover_year: raw.executive_cover_year,
            progress_interval: raw.progress_interval.unwrap_or(defaults.progress_interval),
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub input: ConfigInput,
    #[serde(default)]
    pub output: ConfigOutput,
    #[serde(default)]
    pub parser: ConfigParser,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<(PathBuf, Self)> {
        let base_dir = path.parent().map(ToOwned::to_owned).unwrap_or_default();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());

        Ok((base_dir, config))
    }

    pub fn find_and_load() -> Result<Option<(PathBuf, Self)>> {
        let config_locations = [Path::new("reapprop.toml"), Path::new(".reapprop.toml")];

        for location in &config_locations {
            if location.exists() {
                return Self::load_from_file(location).map(Some);
            }
        }

        Ok(None)
    }
}
