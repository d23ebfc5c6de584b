//! INI file configuration adapter.

use crate::domain::error::SmacrossError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SmacrossError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| SmacrossError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SmacrossError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SmacrossError::ConfigParse {
                file: "<inline>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// An empty configuration; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[api]
token = secret-token
base_url = https://api.wmcloud.com/data/v1
timeout_secs = 15

[analysis]
window = 30
jobs = 4
print_trades = yes

[csv]
ma_column = ma30
"#;

    #[test]
    fn reads_all_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("api", "token"),
            Some("secret-token".to_string())
        );
        assert_eq!(adapter.get_int("api", "timeout_secs", 30), 15);
        assert_eq!(adapter.get_int("analysis", "window", 20), 30);
        assert_eq!(adapter.get_int("analysis", "jobs", 0), 4);
        assert!(adapter.get_bool("analysis", "print_trades", false));
        assert_eq!(adapter.get_string("csv", "ma_column"), Some("ma30".to_string()));
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string("[analysis]\n").unwrap();
        assert_eq!(adapter.get_string("analysis", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("analysis", "window", 20), 20);
        assert!(!adapter.get_bool("analysis", "print_trades", false));
    }

    #[test]
    fn non_numeric_int_falls_back() {
        let adapter = FileConfigAdapter::from_string("[analysis]\nwindow = twenty\n").unwrap();
        assert_eq!(adapter.get_int("analysis", "window", 20), 20);
    }

    #[test]
    fn bool_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[a]\nx = on\ny = OFF\nz = maybe\n").unwrap();
        assert!(adapter.get_bool("a", "x", false));
        assert!(!adapter.get_bool("a", "y", true));
        assert!(adapter.get_bool("a", "z", true));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_int("analysis", "window", 20), 20);
        assert_eq!(adapter.get_string("api", "token"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("analysis", "window", 20), 30);
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/smacross.ini")
            .err()
            .unwrap();
        assert!(
            matches!(err, SmacrossError::ConfigParse { ref file, .. } if file.ends_with("smacross.ini"))
        );
    }
}
