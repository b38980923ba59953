use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::memory::UserTable;
use super::{StoreError, UserRepository};
use crate::modules::auth::user::User;

/// User store persisted as a single JSON document.
///
/// Every mutation rewrites the whole file under the table lock, so readers in
/// this process never observe a half-applied change.
#[derive(Debug)]
pub struct JsonFileUserStore {
    path: PathBuf,
    table: Mutex<UserTable>,
}

impl JsonFileUserStore {
    /// Open the store at `path`, starting empty if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let table = match fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => UserTable::new(),
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No user store at {}, starting empty", path.display());
                UserTable::new()
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} users from {}", table.len(), path.display());
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, table: &UserTable) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(table)?;

        // Write next to the target and rename over it
        let tmp_path = self.path.with_extension("json.tmp");
        let result = write_and_rename(&tmp_path, &self.path, data.as_bytes());
        if result.is_err() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", tmp_path.display(), e);
                }
            }
        }
        result.map_err(StoreError::from)
    }

    /// Apply `change` to a copy of the table and persist it; memory is only
    /// updated once the file write succeeded.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut UserTable) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut table = self.table.lock();
        let mut next = table.clone();
        let result = change(&mut next)?;
        self.save(&next)?;
        *table = next;
        Ok(result)
    }
}

fn write_and_rename(tmp_path: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp_path, path)
}

impl UserRepository for JsonFileUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.lock().find_by_email(email))
    }

    fn find_by_activation_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.lock().find_by_activation_token(token))
    }

    fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.lock().find_by_reset_token(token))
    }

    fn add(&self, user: User) -> Result<User, StoreError> {
        self.mutate(|table| table.add(user))
    }

    fn update(&self, user: &User) -> Result<(), StoreError> {
        self.mutate(|table| table.update(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::password::HashedPassword;
    use chrono::Utc;
    use tempfile::TempDir;

    fn new_user(email: &str) -> User {
        User::new(
            email,
            HashedPassword {
                hash: "1$00".to_string(),
                salt: "salt".to_string(),
            },
            "activation".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileUserStore::open(dir.path().join("users.json")).unwrap();
        assert!(store.find_by_email("a@x.com").unwrap().is_none());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");

        let id = {
            let store = JsonFileUserStore::open(&path).unwrap();
            let mut user = store.add(new_user("a@x.com")).unwrap();
            user.is_active = true;
            user.activation_token = None;
            store.update(&user).unwrap();
            user.id
        };

        let reopened = JsonFileUserStore::open(&path).unwrap();
        let user = reopened.find_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_active);
        assert_eq!(user.version, 1);

        // Id sequence continues after reopen
        let next = reopened.add(new_user("b@x.com")).unwrap();
        assert!(next.id > id);
    }

    #[test]
    fn test_failed_mutation_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileUserStore::open(&path).unwrap();
        store.add(new_user("a@x.com")).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        assert!(matches!(
            store.add(new_user("a@x.com")),
            Err(StoreError::DuplicateEmail)
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_failed_write_cleans_up_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileUserStore::open(&path).unwrap();

        // A directory in place of the target makes the final rename fail
        fs::create_dir(&path).unwrap();
        assert!(matches!(
            store.add(new_user("a@x.com")),
            Err(StoreError::Io(_))
        ));

        assert!(!dir.path().join("users.json.tmp").exists());
        assert!(store.find_by_email("a@x.com").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileUserStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
