use std::{
    fs, io,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use interpreter::{ExportOptions, Format};
use serde::Deserialize;
use thiserror::Error;

use crate::draw::{MAX_HEIGHT, MAX_WIDTH};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Settings read from a JSON file. Every key is optional.
///
/// ```json
/// {
///   "export": { "format": "latex", "title": "Homework" },
///   "draw": { "width": 60, "height": 15, "from": -3.0, "to": 3.0 },
///   "show_error_details": true
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub export: ExportOptions,
    pub draw: DrawConfig,
    /// Print why a line failed next to its `error` marker.
    pub show_error_details: bool,
}

/// Geometry of the `:draw` plot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawConfig {
    pub width: usize,
    pub height: usize,
    pub from: f64,
    pub to: f64,
}

impl Default for DrawConfig {
    fn default() -> Self {
        DrawConfig {
            width: 100,
            height: 20,
            from: -5.0,
            to: 5.0,
        }
    }
}

impl DrawConfig {
    pub fn range(&self) -> RangeInclusive<f64> {
        self.from..=self.to
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Export settings for `path`. A format given here wins over the file
    /// extension, which wins over the configured format.
    pub fn export_options(&self, path: &Path, format: Option<Format>) -> ExportOptions {
        let format = format
            .or_else(|| Format::from_path(path))
            .unwrap_or(self.export.format);
        ExportOptions {
            format,
            ..self.export.clone()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let draw = &self.draw;
        if draw.width < 2 || draw.height < 2 {
            return Err(ConfigError::Invalid("draw area must be at least 2x2"));
        }
        if draw.width > MAX_WIDTH || draw.height > MAX_HEIGHT {
            return Err(ConfigError::Invalid("draw area must be at most 1000x500"));
        }
        if !(draw.from.is_finite() && draw.to.is_finite() && draw.from < draw.to) {
            return Err(ConfigError::Invalid("draw range must be finite and increasing"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(text: &str) -> Result<Config, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        Config::load(file.path())
    }

    #[test]
    fn missing_keys_take_defaults() {
        assert_eq!(load("{}").unwrap(), Config::default());
        let config = load(r#"{ "draw": { "width": 40 } }"#).unwrap();
        assert_eq!(config.draw.width, 40);
        assert_eq!(config.draw.height, 20);
    }

    #[test]
    fn reads_every_section() {
        let config = load(
            r#"{
                "export": { "format": "latex", "title": "Homework" },
                "draw": { "width": 60, "height": 15, "from": -3.0, "to": 3.0 },
                "show_error_details": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.export.format, Format::Latex);
        assert_eq!(config.export.title.as_deref(), Some("Homework"));
        assert_eq!(config.export.comment, None);
        assert_eq!(config.draw.range(), -3.0..=3.0);
        assert!(config.show_error_details);
    }

    #[test]
    fn picks_the_export_format() {
        let config = load(r#"{ "export": { "format": "plain", "title": "T" } }"#).unwrap();
        let options = config.export_options(Path::new("tape.tex"), None);
        assert_eq!(options.format, Format::Latex);
        assert_eq!(options.title.as_deref(), Some("T"));
        assert_eq!(
            config.export_options(Path::new("tape"), None).format,
            Format::Plain
        );
        assert_eq!(
            config
                .export_options(Path::new("tape.tex"), Some(Format::Markdown))
                .format,
            Format::Markdown
        );
    }

    #[test]
    fn rejects_unknown_keys_and_bad_geometry() {
        assert!(matches!(
            load(r#"{ "colour": "red" }"#),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            load(r#"{ "export": { "format": "docx" } }"#),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            load(r#"{ "draw": { "from": 1.0, "to": -1.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(r#"{ "draw": { "width": 4611686018427387903 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(r#"{ "draw": { "width": 1000, "height": 501 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(load(r#"{ "draw": { "width": 1000, "height": 500 } }"#).is_ok());
        assert!(matches!(
            Config::load(Path::new("/no/such/printcalc.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
