//! Output formatting utilities

use console::{style, Style};
use serde::Serialize;

use appconnect_client::Resource;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for resource ids
pub fn id_style() -> Style {
    Style::new().dim()
}

/// Style for states such as `READY_FOR_SALE`
pub fn state_style() -> Style {
    Style::new().yellow()
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Print a value as pretty JSON
pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print one resource as a flat JSON object
pub fn resource_json<A: Serialize>(resource: &Resource<A>) -> anyhow::Result<()> {
    json(&resource.flatten())
}

/// Print resources as a JSON array of flat objects
pub fn resources_json<A: Serialize>(resources: &[Resource<A>]) -> anyhow::Result<()> {
    let flat: Vec<_> = resources.iter().map(Resource::flatten).collect();
    json(&flat)
}

/// Ask before a destructive action; `true` means go ahead
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Placeholder for missing optional values
pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_contains_both_parts() {
        let line = key_value("State", "READY_FOR_SALE");
        assert!(line.contains("State"));
        assert!(line.contains("READY_FOR_SALE"));
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("1.0")), "1.0");
    }
}
