use super::{EmailError, SecureEmailManager};
use crate::modules::utils::io::{is_valid_email, prompt_password, read_line};

const DEFAULT_SMTP_PORT: u16 = 587;

/// Interactively collect SMTP settings and store them in the keyring
pub fn setup_email_credentials(manager: &SecureEmailManager) -> Result<(), EmailError> {
    println!("\n=== Email Configuration Setup ===");

    let host = loop {
        println!("Enter SMTP server address (e.g., smtp.gmail.com):");
        let input = read_input()?;
        match validate_host(&input) {
            Some(host) => break host,
            None => println!("Invalid SMTP server format. Please enter a valid domain."),
        }
    };

    let port = loop {
        println!("Enter SMTP port (default: {}):", DEFAULT_SMTP_PORT);
        let input = read_input()?;
        match parse_port(&input) {
            Some(port) => break port,
            None => println!("Invalid port number. Please enter a value between 1 and 65535."),
        }
    };

    let username = loop {
        println!("Enter the sender email address:");
        let input = read_input()?;
        if is_valid_email(&input) {
            break input.trim().to_string();
        }
        println!("Invalid email format. Please try again.");
    };

    let password = prompt_password("SMTP password (app password)")
        .map_err(|e| EmailError::Credentials(format!("failed to read password: {}", e)))?;
    if password.is_empty() {
        return Err(EmailError::Credentials("SMTP password cannot be empty".to_string()));
    }

    manager.store_credentials(&username, &password, &host, port)?;
    println!("Email credentials stored in the system keyring.");
    Ok(())
}

fn read_input() -> Result<String, EmailError> {
    read_line().map_err(|e| EmailError::Credentials(format!("failed to read input: {}", e)))
}

fn validate_host(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() || !input.contains('.') || input.contains(' ') {
        return None;
    }
    Some(input.to_string())
}

fn parse_port(input: &str) -> Option<u16> {
    let input = input.trim();
    if input.is_empty() {
        return Some(DEFAULT_SMTP_PORT);
    }
    match input.parse::<u16>() {
        Ok(p) if p > 0 => Some(p),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(""), Some(587));
        assert_eq!(parse_port(" 465 "), Some(465));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port("smtp"), None);
    }

    #[test]
    fn test_validate_host() {
        assert_eq!(validate_host(" smtp.gmail.com "), Some("smtp.gmail.com".to_string()));
        assert_eq!(validate_host("localhost"), None);
        assert_eq!(validate_host("smtp .example.com"), None);
        assert_eq!(validate_host(""), None);
    }
}
