use clap::{Arg, ArgMatches, Command};
use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::process;

use secure_auth::email::{setup_email_credentials, SecureEmailManager};
use secure_auth::utils::io::{is_valid_email, prompt_new_password, prompt_password};
use secure_auth::utils::logging::initialize_logging;
use secure_auth::utils::time::{format_duration, utc_to_local};
use secure_auth::{
    AuthConfig, ConsoleNotifier, CredentialManager, JsonFileUserStore, ManagerSettings, Notifier,
    SmtpNotifier, CONFIG_FILE,
};

type Manager = CredentialManager<JsonFileUserStore, Box<dyn Notifier>>;

fn cli() -> Command {
    Command::new("secure-auth")
        .about("Account registration, activation and password reset")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Path to the JSON configuration file"),
        )
        .subcommand(
            Command::new("register")
                .about("Register a new account and send its activation link")
                .arg(Arg::new("email").help("Account email address").required(true)),
        )
        .subcommand(
            Command::new("login")
                .about("Check an email and password")
                .arg(Arg::new("email").help("Account email address").required(true)),
        )
        .subcommand(
            Command::new("activate")
                .about("Activate an account with the token from its activation link")
                .arg(Arg::new("token").help("Activation token").required(true)),
        )
        .subcommand(
            Command::new("resend-activation")
                .about("Issue a fresh activation link for an inactive account")
                .arg(Arg::new("email").help("Account email address").required(true)),
        )
        .subcommand(
            Command::new("request-reset")
                .about("Send a password reset link")
                .arg(Arg::new("email").help("Account email address").required(true)),
        )
        .subcommand(
            Command::new("reset-password")
                .about("Set a new password using a reset token")
                .arg(Arg::new("token").help("Reset token").required(true)),
        )
        .subcommand(Command::new("smtp-setup").about("Store SMTP credentials in the system keyring"))
        .subcommand(Command::new("smtp-clear").about("Remove SMTP credentials from the system keyring"))
}

/// Prefer SMTP when credentials are stored, otherwise print links to stdout
fn build_notifier(config: &AuthConfig) -> Box<dyn Notifier> {
    let credentials = SecureEmailManager::new().and_then(|manager| manager.get_credentials());
    match credentials {
        Ok(creds) => Box::new(SmtpNotifier::new(
            creds,
            &config.sender_name,
            config.reset_token_ttl_hours,
        )),
        Err(e) => {
            warn!("SMTP not configured ({}), printing links instead", e);
            Box::new(ConsoleNotifier)
        }
    }
}

fn build_manager(config: &AuthConfig) -> Result<Manager, Box<dyn Error>> {
    let store = JsonFileUserStore::open(&config.users_file)?;
    let manager = CredentialManager::new(
        store,
        build_notifier(config),
        ManagerSettings::from(config),
    )?;
    Ok(manager)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = AuthConfig::load(&config_path)?;

    if let Err(e) = initialize_logging(&config.log_file) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    info!("Using configuration at {}", config_path.display());

    match matches.subcommand() {
        Some(("register", sub)) => {
            let email = required(sub, "email");
            if !is_valid_email(email) {
                return Err(format!("'{}' is not a valid email address", email).into());
            }
            let password = prompt_new_password()?;
            let user = build_manager(&config)?.register(email, &password)?;
            println!(
                "Registered {}. Check your inbox for the activation link.",
                user.email
            );
        }
        Some(("login", sub)) => {
            let password = prompt_password("Password")?;
            let user = build_manager(&config)?.login(required(sub, "email"), &password)?;
            println!("Credentials valid for {}", user.email);
            println!("  created: {}", utc_to_local(&user.created_at));
            println!("  active:  {}", user.is_active);
        }
        Some(("activate", sub)) => {
            let user = build_manager(&config)?.activate_user(required(sub, "token"))?;
            println!("Account {} is now active.", user.email);
        }
        Some(("resend-activation", sub)) => {
            build_manager(&config)?.resend_activation(required(sub, "email"))?;
            println!("A new activation link has been sent.");
        }
        Some(("request-reset", sub)) => {
            build_manager(&config)?.request_password_reset(required(sub, "email"))?;
            println!(
                "A reset link valid for {} has been sent.",
                format_duration(config.reset_token_ttl_hours * 3600)
            );
        }
        Some(("reset-password", sub)) => {
            let manager = build_manager(&config)?;
            let password = prompt_new_password()?;
            manager.reset_password(required(sub, "token"), &password)?;
            println!("Password updated.");
        }
        Some(("smtp-setup", _)) => {
            setup_email_credentials(&SecureEmailManager::new()?)?;
        }
        Some(("smtp-clear", _)) => {
            SecureEmailManager::new()?.delete_credentials()?;
            println!("SMTP credentials removed.");
        }
        _ => unreachable!("clap enforces a subcommand"),
    }
    Ok(())
}

fn main() {
    let matches = cli().get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_parses_global_config_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["secure-auth", "register", "a@x.com", "--config", "alt.json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("config").map(String::as_str),
            Some("alt.json")
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "register");
        assert_eq!(required(sub, "email"), "a@x.com");
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(cli().try_get_matches_from(["secure-auth"]).is_err());
    }
}
