//! Shared start-up for the command-line tools.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use complaint_core::config::{Config, Settings};

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Layered settings with every path anchored at the working directory.
pub fn load_settings() -> Result<Settings> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    settings.resolve_paths(&std::env::current_dir()?);
    Ok(settings)
}

/// First `max` characters of `text` on one line.
pub fn snippet(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max { return flat; }
    let mut cut: String = flat.chars().take(max).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::snippet;

    #[test]
    fn snippet_flattens_and_truncates() {
        assert_eq!(snippet("a\n b", 10), "a b");
        assert_eq!(snippet("abcdef", 3), "abc...");
    }
}
