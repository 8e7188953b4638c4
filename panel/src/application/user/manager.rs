use std::collections::HashMap;

use anyhow::Result;
use simplelog::info;
use stored::StoredUser;
use tokio::fs;

use crate::{
    application::server::manager::ServerManager,
    resource::{CreateResourceError, DeleteResourceError},
    storage::Storage,
};

use super::User;

pub struct UserManager {
    users: HashMap<String, User>,
}

impl UserManager {
    pub async fn init() -> Result<Self> {
        info!("Loading users...");
        let mut users = HashMap::new();

        let directory = Storage::users_directory();
        if !directory.exists() {
            fs::create_dir_all(&directory).await?;
        }

        for (_, _, name, value) in Storage::for_each_content_toml::<StoredUser>(
            &directory,
            "Failed to read user from file",
        )
        .await?
        {
            users.insert(name.clone(), User::new(&name, value));
        }

        info!("Loaded {} user(s)", users.len());
        Ok(Self { users })
    }

    pub async fn create_user(
        &mut self,
        username: &str,
        email: &str,
    ) -> Result<(), CreateResourceError> {
        if self.users.contains_key(username) {
            return Err(CreateResourceError::AlreadyExists);
        }

        let user = User::new(username, StoredUser::new(email));
        user.save().await.map_err(CreateResourceError::Error)?;
        self.users.insert(username.to_string(), user);
        info!("Created user {}", username);
        Ok(())
    }

    pub async fn delete_user(
        &mut self,
        username: &str,
        servers: &ServerManager,
    ) -> Result<(), DeleteResourceError> {
        if servers.is_user_used(username) {
            return Err(DeleteResourceError::StillInUse);
        }
        let user = self
            .users
            .get(username)
            .ok_or(DeleteResourceError::NotFound)?;
        user.delete().await?;
        self.users.remove(username);
        info!("Deleted user {}", username);
        Ok(())
    }

    pub fn get_users(&self) -> Vec<&User> {
        self.users.values().collect()
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn get_user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }
}

impl User {
    pub(crate) fn new(username: &str, user: StoredUser) -> Self {
        Self {
            username: username.to_string(),
            email: user.into_email(),
        }
    }
}

pub(crate) mod stored {
    use serde::{Deserialize, Serialize};

    use crate::{
        application::user::User,
        storage::{LoadFromTomlFile, SaveToTomlFile},
    };

    #[derive(Serialize, Deserialize)]
    pub struct StoredUser {
        email: String,
    }

    impl StoredUser {
        pub fn new(email: &str) -> Self {
            Self {
                email: email.to_string(),
            }
        }

        pub fn from(user: &User) -> Self {
            Self {
                email: user.email.clone(),
            }
        }

        pub fn into_email(self) -> String {
            self.email
        }
    }

    impl LoadFromTomlFile for StoredUser {}
    impl SaveToTomlFile for StoredUser {}
}
