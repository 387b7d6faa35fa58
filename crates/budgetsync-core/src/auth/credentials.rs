use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "budgetsync";

/// Remembered login passwords, kept in the OS keychain.
///
/// Entries are scoped to one backend, so the same email on a staging and a
/// production server keeps two separate passwords.
pub struct CredentialStore {
    server: String,
}

impl CredentialStore {
    pub fn for_server(base_url: &str) -> Self {
        let server = base_url
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_lowercase();
        Self { server }
    }

    /// Keychain account name: the normalized email at the server host.
    fn account(&self, email: &str) -> String {
        format!("{}@{}", email.trim().to_lowercase(), self.server)
    }

    fn entry(&self, email: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account(email)).context("Failed to create keyring entry")
    }

    pub fn store(&self, email: &str, password: &str) -> Result<()> {
        self.entry(email)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    pub fn get_password(&self, email: &str) -> Result<String> {
        self.entry(email)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    pub fn delete(&self, email: &str) -> Result<()> {
        self.entry(email)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }
}
