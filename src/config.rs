use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DashboardError;

/// Public GeoJSON with one feature per Brazilian state, keyed by `properties.name`.
pub const DEFAULT_BOUNDARIES_URL: &str = "https://raw.githubusercontent.com/codeforamerica/click_that_hood/master/public/data/brazil-states.geojson";

pub const ENV_CONFIG_FILE: &str = "ENEM_DASHBOARD_CONFIG";
pub const ENV_DATA_DIR: &str = "ENEM_DATA_DIR";
pub const ENV_YEARS: &str = "ENEM_YEARS";
pub const ENV_BOUNDARIES_URL: &str = "ENEM_BOUNDARIES_URL";

/// Where the yearly batches live and where the map boundaries come from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding one Parquet file per exam year.
    pub data_dir: PathBuf,
    /// File name prefix; batches are `<prefix><year>.parquet`.
    pub file_prefix: String,
    /// Exam years to load. Every one of them must have a batch.
    pub years: Vec<i32>,
    /// URL of the state boundary GeoJSON.
    pub boundaries_url: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_prefix: "enem_".to_string(),
            years: (2018..=2023).collect(),
            boundaries_url: DEFAULT_BOUNDARIES_URL.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Path of the batch for `year`.
    pub fn batch_path(&self, year: i32) -> PathBuf {
        self.data_dir
            .join(format!("{}{year}.parquet", self.file_prefix))
    }

    /// Same configuration pointed at another data directory.
    pub fn with_data_dir(&self, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..self.clone()
        }
    }

    /// Read a JSON configuration file. Absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, DashboardError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            DashboardError::Configuration(format!("reading {}: {err}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|err| {
            DashboardError::Configuration(format!("parsing {}: {err}", path.display()))
        })
    }

    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, DashboardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// A config file named by [`ENV_CONFIG_FILE`] is applied first; the
    /// individual variables then override it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DashboardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = match var(ENV_CONFIG_FILE) {
            Some(path) => Self::from_json_file(Path::new(path.trim()))?,
            None => Self::default(),
        };
        if let Some(dir) = var(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(years) = var(ENV_YEARS) {
            config.years = parse_years(&years)?;
        }
        if let Some(url) = var(ENV_BOUNDARIES_URL) {
            config.boundaries_url = url.trim().to_string();
        }
        if config.years.is_empty() {
            return Err(DashboardError::Configuration(
                "at least one exam year must be configured".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Parse a comma-separated year list such as `"2018, 2019,2020"`.
fn parse_years(raw: &str) -> Result<Vec<i32>, DashboardError> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<i32>().map_err(|_| {
                DashboardError::Configuration(format!("{ENV_YEARS}: '{token}' is not a year"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_cover_six_years() {
        let config = DashboardConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.years, vec![2018, 2019, 2020, 2021, 2022, 2023]);
        assert_eq!(
            config.batch_path(2020),
            PathBuf::from("data").join("enem_2020.parquet")
        );
        assert_eq!(config.boundaries_url, DEFAULT_BOUNDARIES_URL);
    }

    #[test]
    fn environment_overrides_apply() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            (ENV_DATA_DIR, "/srv/enem"),
            (ENV_YEARS, "2022, 2023"),
            (ENV_BOUNDARIES_URL, "http://localhost/states.json"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/enem"));
        assert_eq!(config.years, vec![2022, 2023]);
        assert_eq!(config.boundaries_url, "http://localhost/states.json");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = DashboardConfig::from_lookup(lookup_from(&[(ENV_DATA_DIR, "  ")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn malformed_year_is_a_configuration_error() {
        let err = DashboardConfig::from_lookup(lookup_from(&[(ENV_YEARS, "2019,twenty")]))
            .unwrap_err();
        assert!(matches!(err, DashboardError::Configuration(msg) if msg.contains("twenty")));
    }

    #[test]
    fn json_file_is_applied_before_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"data_dir": "from-file", "years": [2019], "file_prefix": "microdados_"}}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = DashboardConfig::from_lookup(lookup_from(&[
            (ENV_CONFIG_FILE, path.as_str()),
            (ENV_YEARS, "2021"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("from-file"));
        assert_eq!(config.years, vec![2021]);
        assert_eq!(
            config.batch_path(2021),
            PathBuf::from("from-file").join("microdados_2021.parquet")
        );
    }
}
