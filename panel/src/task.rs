use std::any::Any;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::oneshot::Sender;

use crate::application::Panel;

pub mod manager;

pub type BoxedTask = Box<dyn GenericTask + Send>;
pub type BoxedAny = Box<dyn Any + Send>;

pub struct Task {
    pub task: BoxedTask,
    pub sender: Sender<Result<BoxedAny>>,
}

impl Task {
    pub async fn run(mut self, panel: &mut Panel) -> Result<()> {
        let result = self.task.run(panel).await;
        self.sender
            .send(result)
            .map_err(|_| anyhow!("Failed to send task result to the task sender"))
    }
}

#[async_trait]
pub trait GenericTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny>;
}
