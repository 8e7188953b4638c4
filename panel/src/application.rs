use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use draft::manager::DraftManager;
use draft::rules::{BasicRuleEvaluator, RuleEvaluator};
use egg::manager::EggManager;
use node::manager::NodeManager;
use server::manager::ServerManager;
use simplelog::info;
use tokio::{select, time::interval};
use user::manager::UserManager;

use crate::{
    config::Config,
    task::manager::{TaskManager, TaskSender},
};

pub mod draft;
pub mod egg;
pub mod node;
pub mod server;
pub mod user;

const TICK_RATE: u64 = 20;

pub struct Panel {
    /* State */
    running: Arc<AtomicBool>,

    /* Tasks */
    tasks: TaskManager,

    /* Components */
    pub(crate) eggs: EggManager,
    pub(crate) nodes: NodeManager,
    pub(crate) users: UserManager,
    pub(crate) servers: ServerManager,
    pub(crate) drafts: DraftManager,

    /* Validation */
    pub(crate) evaluator: Box<dyn RuleEvaluator + Send + Sync>,

    /* Config */
    config: Config,
}

impl Panel {
    pub async fn init(config: Config) -> Result<Self> {
        let eggs = EggManager::init().await?;
        let mut nodes = NodeManager::init().await?;
        let users = UserManager::init().await?;
        let servers = ServerManager::init(&mut nodes).await?;

        Ok(Self {
            running: Arc::new(AtomicBool::new(true)),
            tasks: TaskManager::init(),
            eggs,
            nodes,
            users,
            servers,
            drafts: DraftManager::init(),
            evaluator: Box::new(BasicRuleEvaluator),
            config,
        })
    }

    /// The sender is the seam a frontend uses to talk to the panel while the
    /// run loop owns it.
    pub fn task_sender(&self) -> TaskSender {
        self.tasks.get_sender()
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup signal handlers
        self.setup_handlers()?;
        self.tasks.set_ready(true);

        // Main loop
        let mut interval = interval(Duration::from_millis(1000 / TICK_RATE));
        while self.running.load(Ordering::Relaxed) {
            select! {
                _ = interval.tick() => self.tick().await?,
                task = self.tasks.recv() => if let Some(task) = task {
                    task.run(self).await?;
                }
            }
        }

        // Shutdown
        self.tasks.set_ready(false);
        self.shutdown().await?;

        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        // Tick server manager
        self.servers.tick().await?;

        // Tick draft manager
        self.drafts.tick(&self.config)?;

        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Starting shutdown sequence...");

        // Shutdown draft manager
        self.drafts.shutdown()?;

        // Shutdown server manager
        self.servers.shutdown().await?;

        info!("Shutdown complete. Bye :)");
        Ok(())
    }

    fn setup_handlers(&self) -> Result<()> {
        let flag = self.running.clone();
        ctrlc::set_handler(move || {
            info!("Received SIGINT, shutting down...");
            flag.store(false, Ordering::Relaxed);
        })
        .map_err(|error| error.into())
    }
}
