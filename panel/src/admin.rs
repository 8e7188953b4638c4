// Tasks the frontend glue drives through the panel's task queue. This is
// the whole surface the UI layer sees.

use std::{
    any::type_name,
    fmt::{Display, Formatter},
};

use anyhow::{anyhow, Result};
use common::error::FancyError;
use simplelog::debug;
use tokio::sync::oneshot::channel;

use crate::task::{manager::TaskSender, BoxedAny, BoxedTask, Task};

pub mod draft;
pub mod egg;
pub mod node;
pub mod server;
pub mod user;

pub enum AdminError {
    NotFound(String),
    AlreadyExists(String),
    Precondition(String),
    Invalid(String),
    Internal(String),
}

impl Display for AdminError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminError::NotFound(message)
            | AdminError::AlreadyExists(message)
            | AdminError::Precondition(message)
            | AdminError::Invalid(message)
            | AdminError::Internal(message) => write!(formatter, "{}", message),
        }
    }
}

pub struct AdminTask;

impl AdminTask {
    /// Runs a task through the panel's queue and waits for its typed
    /// result.
    pub async fn execute<O: Send + 'static>(
        queue: &TaskSender,
        task: BoxedTask,
    ) -> Result<O, AdminError> {
        debug!(
            "Executing admin task with a return type of: {}",
            type_name::<O>()
        );
        match Self::create::<O>(queue, task).await {
            Ok(value) => value,
            Err(error) => {
                FancyError::print_fancy(&error, false);
                Err(AdminError::Internal(error.to_string()))
            }
        }
    }

    pub async fn create<T: Send + 'static>(
        queue: &TaskSender,
        task: BoxedTask,
    ) -> Result<Result<T, AdminError>> {
        let (sender, receiver) = channel();
        queue
            .inner()?
            .send(Task { task, sender })
            .await
            .map_err(|_| anyhow!("Failed to send task to task queue"))?;
        let result = receiver.await??;
        match result.downcast::<T>() {
            Ok(result) => Ok(Ok(*result)),
            Err(result) => match result.downcast::<AdminError>() {
                Ok(result) => Ok(Err(*result)),
                Err(_) => Err(anyhow!(
                    "Failed to downcast task result to the expected type. Check task implementation"
                )),
            },
        }
    }

    #[allow(clippy::unnecessary_wraps)]
    pub fn new_ok<T: Send + 'static>(value: T) -> Result<BoxedAny> {
        Ok(Box::new(value))
    }

    pub fn new_empty() -> Result<BoxedAny> {
        Self::new_ok(())
    }

    #[allow(clippy::unnecessary_wraps)]
    pub fn new_err(value: AdminError) -> Result<BoxedAny> {
        Ok(Box::new(value))
    }
}
