// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{auth, config, email, store, utils};

// Re-export commonly used types
pub use modules::auth::{AuthError, CredentialManager, ManagerSettings, User};
pub use modules::config::AuthConfig;
pub use modules::email::{ConsoleNotifier, Notifier, SmtpNotifier};
pub use modules::store::{InMemoryUserStore, JsonFileUserStore, UserRepository};

// Constants
pub const USERS_FILE: &str = "users.json";
pub const CONFIG_FILE: &str = "auth_config.json";

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
