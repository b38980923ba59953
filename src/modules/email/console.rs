use log::info;

use super::{EmailError, Notifier};
use crate::modules::utils::logging::format_sensitive;

/// Prints links to stdout instead of sending mail.
///
/// The CLI falls back to this when no SMTP credentials are stored, which keeps
/// the activation and reset flows usable on a development machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send_activation_email(&self, email: &str, activation_link: &str) -> Result<(), EmailError> {
        info!("Printing activation link for {}", format_sensitive(email));
        println!("Activation link for {}:\n  {}", email, activation_link);
        Ok(())
    }

    fn send_password_reset_email(&self, email: &str, reset_link: &str) -> Result<(), EmailError> {
        info!("Printing reset link for {}", format_sensitive(email));
        println!("Password reset link for {}:\n  {}", email, reset_link);
        Ok(())
    }
}
