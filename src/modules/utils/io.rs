use std::io::{self, Write};

/// Helper function to read a line from stdin
pub fn read_line() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompt for a secret without echoing it to the terminal
pub fn prompt_password(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    rpassword::read_password()
}

/// Prompt twice for a new password and make sure both entries agree
pub fn prompt_new_password() -> io::Result<String> {
    let first = prompt_password("New password")?;
    let second = prompt_password("Confirm password")?;
    if first != second {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Passwords do not match",
        ));
    }
    if first.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Password must not be empty",
        ));
    }
    Ok(first)
}

/// Helper function to validate email format
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    email.contains('@')
        && email.contains('.')
        && !email.contains(' ')
        && email.chars().filter(|&c| c == '@').count() == 1
        && email.len() >= 5
        && !email.starts_with('@')
        && !email.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.co.uk"));
        assert!(is_valid_email("  user+tag@example.com "));

        assert!(!is_valid_email("user@example")); // Missing TLD
        assert!(!is_valid_email("user example.com"));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example."));
    }
}
