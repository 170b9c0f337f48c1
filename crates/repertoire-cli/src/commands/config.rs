use anyhow::{Context, Result};
use serde_json::Value;
use toml_edit::DocumentMut;

use repertoire_discovery::{config, Config};

/// Settings printed masked.
const SECRET_KEYS: [&str; 2] = ["extraction_api_key", "verification_secret"];

fn settings(config: &Config) -> Result<serde_json::Map<String, Value>> {
    match serde_json::to_value(config).context("Failed to serialize configuration")? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Configuration did not serialize to a table"),
    }
}

fn display_value(key: &str, value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        _ if SECRET_KEYS.contains(&key) => "********".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn valid_keys(config: &Config) -> Result<String> {
    Ok(settings(config)?
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", "))
}

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    println!(
        "File exists: {}\n",
        if config_path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    for (key, value) in settings(config)? {
        println!("  {}: {}", key, display_value(&key, &value));
    }

    println!("\nPriority: CLI args > ENV vars (REPERTOIRE_*) > Config file > Defaults");

    Ok(())
}

/// Print one setting, or the whole config file when no key is given.
pub fn get_config(config: &Config, key: Option<&str>) -> Result<()> {
    let Some(key) = key else {
        let config_path = config::config_file_path();
        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'repertoire config init' to create it.");
        }
        return Ok(());
    };

    match settings(config)?.get(key) {
        // Values are printed unmasked so they can be used in scripts.
        Some(Value::String(s)) => println!("{}", s),
        Some(Value::Null) => println!("<not set>"),
        Some(other) => println!("{}", other),
        None => anyhow::bail!(
            "Unknown config key: {}\n\nValid keys: {}",
            key,
            valid_keys(config)?
        ),
    }

    Ok(())
}

/// Convert `raw` to a TOML value shaped like the setting's default.
fn typed_value(default: &Value, key: &str, raw: &str) -> Result<toml_edit::Item> {
    let item = match default {
        Value::Bool(_) => toml_edit::value(
            raw.parse::<bool>()
                .with_context(|| format!("{key} expects true or false"))?,
        ),
        Value::Number(_) => toml_edit::value(
            raw.parse::<i64>()
                .with_context(|| format!("{key} expects a whole number"))?,
        ),
        _ => toml_edit::value(raw),
    };
    Ok(item)
}

/// Set a value in `contents`, keeping comments and layout.
fn apply_setting(contents: &str, key: &str, raw: &str) -> Result<String> {
    let defaults = settings(&Config::default())?;
    let default = defaults.get(key).ok_or_else(|| {
        let keys: Vec<&str> = defaults.keys().map(String::as_str).collect();
        anyhow::anyhow!("Unknown config key: {}\n\nValid keys: {}", key, keys.join(", "))
    })?;

    let mut doc: DocumentMut = contents.parse().context("Config file is not valid TOML")?;
    doc[key] = typed_value(default, key, raw)?;
    Ok(doc.to_string())
}

/// Write a setting to the config file.
pub fn set_config(key: &str, value: &str) -> Result<()> {
    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = apply_setting(&contents, key, value)?;
    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, value);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure repertoire.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
