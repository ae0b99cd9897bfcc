//! Config subcommands handler

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};

use segskip::config::migrate_config;
use segskip::Config;

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Show current configuration as TOML.
pub fn handle_show() -> Result<()> {
    let config = Config::load()?;
    let toml_str = toml::to_string_pretty(&config)?;
    print!("{}", toml_str);
    Ok(())
}

pub fn handle_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Open configuration file in the default editor.
///
/// Uses $EDITOR environment variable (defaults to 'vi').
#[cfg(not(tarpaulin_include))]
pub fn handle_edit() -> Result<()> {
    let config_path = Config::config_path()?;

    // Ensure config exists, with a voting identity
    if !config_path.exists() {
        let mut config = Config::default();
        config.ensure_user_id();
        config.save()?;
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    println!("Opening {} with {}", config_path.display(), editor);

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()
        .with_context(|| format!("Failed to open editor {}", editor))?;

    Ok(())
}

/// Migrate config file by adding missing fields.
///
/// Shows the fields that would be added and asks for confirmation unless
/// `yes` is set.
pub fn handle_migrate(yes: bool) -> Result<()> {
    let config_path = Config::config_path()?;
    let file_exists = config_path.exists();

    let content = if file_exists {
        fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?
    } else {
        String::new()
    };

    let result = migrate_config(&content)?;

    if !result.has_changes() {
        println!("Config is already up to date.");
        return Ok(());
    }

    if file_exists {
        println!(
            "Found {} missing field(s) in {} new section(s):",
            result.added_fields.len(),
            result.sections_added.len()
        );
    } else {
        println!("Config file does not exist. Will create with default settings.");
    }
    println!();
    print_diff_preview(&result.content, &result.added_fields, !file_exists);
    println!();

    if !yes && !prompt_confirmation(&format!("Write {}?", config_path.display()))? {
        println!("No changes made.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&config_path, &result.content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Config updated.");

    Ok(())
}

/// Print added lines with a `+` prefix, green on a terminal.
fn print_diff_preview(new_content: &str, added_fields: &[String], is_new_file: bool) {
    let added: HashSet<&str> = added_fields.iter().map(String::as_str).collect();
    let (green, reset) = if atty::is(atty::Stream::Stdout) {
        (GREEN, RESET)
    } else {
        ("", "")
    };

    let mut section = String::new();
    let mut header_printed = false;

    for line in new_content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            section = trimmed[1..trimmed.len() - 1].to_string();
            header_printed = false;
            continue;
        }

        let is_added = match trimmed.find('=') {
            Some(eq_pos) => {
                let key = trimmed[..eq_pos].trim();
                added.contains(format!("{}.{}", section, key).as_str())
            }
            None => false,
        };

        if is_new_file || is_added {
            if !header_printed && !section.is_empty() {
                println!("{}+ [{}]{}", green, section, reset);
                header_printed = true;
            }
            if !trimmed.is_empty() {
                println!("{}+ {}{}", green, line, reset);
            }
        }
    }
}

/// Prompt user for yes/no confirmation.
///
/// If stdin is not a TTY (non-interactive), returns false.
fn prompt_confirmation(message: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        println!("Non-interactive mode: use --yes to apply changes");
        return Ok(false);
    }

    print!("{} [y/N] ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
