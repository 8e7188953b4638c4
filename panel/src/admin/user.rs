use anyhow::Result;
use async_trait::async_trait;

use crate::{
    application::Panel,
    task::{BoxedAny, GenericTask},
};

use super::AdminTask;

pub struct CreateUserTask {
    pub username: String,
    pub email: String,
}
pub struct DeleteUserTask(pub String);
pub struct GetUsersTask;

pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub servers: usize,
}

#[async_trait]
impl GenericTask for CreateUserTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        match panel.users.create_user(&self.username, &self.email).await {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(error.into()),
        }
    }
}

#[async_trait]
impl GenericTask for DeleteUserTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        match panel.users.delete_user(&self.0, &panel.servers).await {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(error.into()),
        }
    }
}

#[async_trait]
impl GenericTask for GetUsersTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let mut users = panel
            .users
            .get_users()
            .iter()
            .map(|user| UserSummary {
                username: user.username().to_string(),
                email: user.email().to_string(),
                servers: panel
                    .servers
                    .get_servers()
                    .iter()
                    .filter(|server| server.owner() == user.username())
                    .count(),
            })
            .collect::<Vec<_>>();
        users.sort_by(|left, right| left.username.cmp(&right.username));
        AdminTask::new_ok(users)
    }
}
