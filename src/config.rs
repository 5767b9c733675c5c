use std::path::PathBuf;

use crate::limits::MAX_UNITS;
use crate::model::Unit;
use crate::report::OutputFormat;

pub const DEFAULT_UNIT_COUNT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} is not set"),
            ConfigError::Invalid { key, reason } => write!(f, "invalid {key}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub units: Vec<Unit>,
    pub format: OutputFormat,
    pub metrics_file: Option<PathBuf>,
}

impl Config {
    /// Read `STAYDESK_*` variables. A positional `input` argument takes
    /// precedence over `STAYDESK_INPUT`.
    pub fn from_env(input: Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(input, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        input: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let input = input
            .or_else(|| lookup("STAYDESK_INPUT"))
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("STAYDESK_INPUT"))?;

        let units = match lookup("STAYDESK_UNITS") {
            Some(spec) => parse_units(&spec)?,
            None => (1..=DEFAULT_UNIT_COUNT).map(Unit).collect(),
        };

        let format = match lookup("STAYDESK_FORMAT") {
            Some(s) => s.parse::<OutputFormat>().map_err(|reason| ConfigError::Invalid {
                key: "STAYDESK_FORMAT",
                reason,
            })?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            input: PathBuf::from(input),
            units,
            format,
            metrics_file: lookup("STAYDESK_METRICS_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// `"3"` means units 1..=3; `"1,2,5"` lists ids explicitly.
pub fn parse_units(spec: &str) -> Result<Vec<Unit>, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "STAYDESK_UNITS",
        reason,
    };
    let spec = spec.trim();
    if !spec.contains(',') {
        let count: u32 = spec
            .parse()
            .map_err(|_| invalid(format!("expected a unit count or id list, got {spec:?}")))?;
        if count == 0 || count as usize > MAX_UNITS {
            return Err(invalid(format!("unit count must be 1..={MAX_UNITS}")));
        }
        return Ok((1..=count).map(Unit).collect());
    }
    spec.split(',')
        .map(|id| {
            id.trim()
                .parse()
                .map(Unit)
                .map_err(|_| invalid(format!("bad unit id {:?}", id.trim())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(Some("res.csv".into()), lookup(&[])).unwrap();
        assert_eq!(config.input, PathBuf::from("res.csv"));
        assert_eq!(config.units, vec![Unit(1), Unit(2), Unit(3)]);
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.metrics_file, None);
    }

    #[test]
    fn env_values() {
        let config = Config::from_lookup(
            None,
            lookup(&[
                ("STAYDESK_INPUT", "/data/in.csv"),
                ("STAYDESK_UNITS", "4, 7"),
                ("STAYDESK_FORMAT", "json"),
                ("STAYDESK_METRICS_FILE", "/tmp/m.prom"),
            ]),
        )
        .unwrap();
        assert_eq!(config.input, PathBuf::from("/data/in.csv"));
        assert_eq!(config.units, vec![Unit(4), Unit(7)]);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.metrics_file, Some(PathBuf::from("/tmp/m.prom")));
    }

    #[test]
    fn argument_overrides_env_input() {
        let config = Config::from_lookup(
            Some("arg.csv".into()),
            lookup(&[("STAYDESK_INPUT", "env.csv")]),
        )
        .unwrap();
        assert_eq!(config.input, PathBuf::from("arg.csv"));
    }

    #[test]
    fn missing_input() {
        assert_eq!(
            Config::from_lookup(None, lookup(&[])),
            Err(ConfigError::Missing("STAYDESK_INPUT"))
        );
    }

    #[test]
    fn unit_specs() {
        assert_eq!(parse_units("2").unwrap(), vec![Unit(1), Unit(2)]);
        assert_eq!(parse_units("3,1").unwrap(), vec![Unit(3), Unit(1)]);
        assert!(parse_units("0").is_err());
        assert!(parse_units("two").is_err());
        assert!(parse_units("1,,2").is_err());
    }

    #[test]
    fn bad_format() {
        let result = Config::from_lookup(
            Some("in.csv".into()),
            lookup(&[("STAYDESK_FORMAT", "yaml")]),
        );
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "STAYDESK_FORMAT", .. })
        ));
    }
}
