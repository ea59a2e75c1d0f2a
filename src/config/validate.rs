// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, VfsWatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = VfsWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_roots(&raw)?;
        validate_global_config(&raw)?;
        validate_keep_locations(&raw)?;
        let cycle = parse_duration(&raw.config.cycle).map_err(|e| {
            VfsWatchError::ConfigError(format!("[config].cycle is invalid: {e}"))
        })?;
        if cycle.is_zero() {
            return Err(VfsWatchError::ConfigError(
                "[config].cycle must be greater than zero".to_string(),
            ));
        }
        Ok(ConfigFile::new_unchecked(raw.config, raw.watch, cycle))
    }
}

fn ensure_has_roots(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.roots.is_empty() {
        return Err(VfsWatchError::ConfigError(
            "[watch].roots must list at least one directory".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.max_hierarchies == 0 {
        return Err(VfsWatchError::ConfigError(
            "[config].max_hierarchies must be >= 1 (got 0)".to_string(),
        ));
    }
    // Otherwise the first work cycle would evict configured roots.
    if cfg.watch.roots.len() > cfg.config.max_hierarchies {
        return Err(VfsWatchError::ConfigError(format!(
            "[watch].roots lists {} directories but [config].max_hierarchies is {}",
            cfg.watch.roots.len(),
            cfg.config.max_hierarchies
        )));
    }
    Ok(())
}

fn validate_keep_locations(cfg: &RawConfigFile) -> Result<()> {
    for keep in cfg.watch.keep.iter() {
        if cfg.watch.roots.contains(keep) {
            return Err(VfsWatchError::ConfigError(format!(
                "{:?} is listed both in [watch].roots and [watch].keep",
                keep
            )));
        }
    }
    Ok(())
}

/// Parse a duration like `"500ms"`, `"10s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_src: &str) -> RawConfigFile {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn accepts_minimal_config_with_defaults() {
        let cfg = ConfigFile::try_from(raw("[watch]\nroots = [\"src\"]\n")).unwrap();
        assert_eq!(cfg.max_hierarchies(), 8);
        assert_eq!(cfg.cycle(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_more_roots_than_max_hierarchies() {
        let err = ConfigFile::try_from(raw(
            "[config]\nmax_hierarchies = 1\n[watch]\nroots = [\"a\", \"b\"]\n",
        ))
        .unwrap_err();
        assert!(matches!(err, VfsWatchError::ConfigError(msg) if msg.contains("max_hierarchies")));
    }

    #[test]
    fn rejects_zero_cycle_and_root_listed_as_keep() {
        assert!(ConfigFile::try_from(raw(
            "[config]\ncycle = \"0s\"\n[watch]\nroots = [\"a\"]\n"
        ))
        .is_err());
        assert!(ConfigFile::try_from(raw("[watch]\nroots = [\"a\"]\nkeep = [\"a\"]\n")).is_err());
    }

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration(" 3s ").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn rejects_missing_or_unknown_units() {
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("s").is_err());
    }
}
