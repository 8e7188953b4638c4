use anyhow::Result;
use tokio::fs;

use crate::storage::{SaveToTomlFile, Storage};

use self::manager::stored::StoredUser;

pub mod manager;

/// An account that can own servers. Authentication is handled outside of the
/// panel, this only carries the identity.
pub struct User {
    username: String,
    email: String,
}

impl User {
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn email(&self) -> &str {
        &self.email
    }

    pub async fn save(&self) -> Result<()> {
        StoredUser::from(self)
            .save(&Storage::user_file(&self.username), true)
            .await
    }

    pub async fn delete(&self) -> Result<()> {
        let path = Storage::user_file(&self.username);
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}
