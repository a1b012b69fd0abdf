//! Environment variable loading.
//!
//! Keeps the fallback chains in one place so callers never repeat `or_else`.

use std::env;
use std::path::Path;
use std::str::FromStr;

/// Load `.env` from the current directory into the environment (existing
/// variables are never overwritten). Runs once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let path = env::current_dir()
            .map(|d| d.join(".env"))
            .unwrap_or_else(|_| std::path::PathBuf::from(".env"));
        load_dotenv_from(&path);
    });
}

/// Load a dotenv-style file into the environment. Returns the number of
/// variables that were set; a missing file sets nothing.
pub fn load_dotenv_from(path: &Path) -> usize {
    let Ok(content) = std::fs::read_to_string(path) else {
        return 0;
    };
    let mut applied = 0;
    for line in content.lines() {
        if let Some((key, value)) = parse_dotenv_line(line) {
            if env::var(key).is_err() {
                env::set_var(key, value);
                applied += 1;
            }
        }
    }
    tracing::debug!(path = %path.display(), applied, "Loaded dotenv file");
    applied
}

/// Parse one `KEY=value` line. Blank lines and `#` comments yield `None`.
/// Inline comments are stripped unless the value is quoted.
fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let mut value = value.trim();
    if let Some(hash_pos) = value.find('#') {
        let before_hash = value[..hash_pos].trim_end();
        if !before_hash.contains('"') && !before_hash.contains('\'') {
            value = before_hash;
        }
    }
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    Some((key, value))
}

/// Read the primary key or the first set alias; empty values fall back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// Read the primary key or an alias as `Option` (blank counts as unset).
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Boolean variable: `0`/`false`/`no`/`off` are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

/// Parse a variable with `FromStr`. Unparseable values log a warning and use `default`.
pub fn env_parse<T>(primary: &str, aliases: &[&str], default: T) -> T
where
    T: FromStr,
{
    match env_optional(primary, aliases) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key = primary, value = %raw, "Ignoring unparseable value");
            default
        }),
        None => default,
    }
}
