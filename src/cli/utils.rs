//! Terminal helpers shared by the stcli commands.

use crate::config::{self, RAO_PER_TAO};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use console::{style, Term};
use dialoguer::{Confirm, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Prompt for confirmation. With `no_prompt` the answer is always yes.
pub fn confirm(message: &str, no_prompt: bool) -> bool {
    if no_prompt {
        return true;
    }

    Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Prompt for a password (hidden input).
pub fn prompt_password(message: &str) -> String {
    Password::new()
        .with_prompt(message)
        .interact()
        .unwrap_or_default()
}

/// Prompt for an optional password; empty input becomes `None`.
pub fn prompt_password_optional(message: &str) -> Option<String> {
    let password = Password::new()
        .with_prompt(message)
        .allow_empty_password(true)
        .interact()
        .unwrap_or_default();

    if password.is_empty() {
        None
    } else {
        Some(password)
    }
}

/// Spinner progress bar with a message.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_success(message: &str) {
    let term = Term::stdout();
    let _ = term.write_line(&format!("{} {}", style("✓").green().bold(), message));
}

pub fn print_error(message: &str) {
    let term = Term::stderr();
    let _ = term.write_line(&format!("{} {}", style("✗").red().bold(), message));
}

pub fn print_info(message: &str) {
    let term = Term::stdout();
    let _ = term.write_line(&format!("{} {}", style("ℹ").blue().bold(), message));
}

pub fn print_warning(message: &str) {
    let term = Term::stdout();
    let _ = term.write_line(&format!("{} {}", style("⚠").yellow().bold(), message));
}

/// Format a RAO balance as TAO with full precision.
pub fn format_tao(rao: u128) -> String {
    let whole = rao / RAO_PER_TAO as u128;
    let fraction = rao % RAO_PER_TAO as u128;
    format!("{}.{:09} τ", whole, fraction)
}

/// Truncate an SS58 address for table display.
pub fn format_address(address: &str) -> String {
    if address.len() <= 18 {
        return address.to_string();
    }
    format!("{}...{}", &address[..8], &address[address.len() - 8..])
}

/// Styled table with bold headers.
pub fn create_table_with_headers(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| style(*h).bold().to_string()));
    table
}

/// Endpoint to dial for the given global flags.
pub fn resolve_endpoint(network: &str, custom_endpoint: Option<&str>) -> String {
    match custom_endpoint {
        Some(endpoint) => endpoint.to_string(),
        None => config::network_to_endpoint(network),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tao() {
        assert_eq!(format_tao(0), "0.000000000 τ");
        assert_eq!(format_tao(1_000_000_000), "1.000000000 τ");
        assert_eq!(format_tao(1_500_000_000), "1.500000000 τ");
        assert_eq!(format_tao(123_456_789_012), "123.456789012 τ");
    }

    #[test]
    fn test_format_address() {
        let addr = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
        assert_eq!(format_address(addr), "5GrwvaEF...oHGKutQY");
        assert_eq!(format_address("5GrwvaEF"), "5GrwvaEF");
    }

    #[test]
    fn test_resolve_endpoint() {
        assert_eq!(resolve_endpoint("finney", None), config::FINNEY_ENDPOINT);
        assert_eq!(
            resolve_endpoint("finney", Some("ws://custom:9944")),
            "ws://custom:9944"
        );
        assert_eq!(resolve_endpoint("ws://10.0.0.5:9944", None), "ws://10.0.0.5:9944");
    }
}
