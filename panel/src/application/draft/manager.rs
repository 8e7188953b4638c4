use std::collections::HashMap;

use anyhow::Result;
use simplelog::{debug, info};
use uuid::Uuid;

use crate::config::Config;

use super::Draft;

/// Holds every in-progress provisioning session. Drafts never touch the
/// disk, abandoning one simply drops it.
pub struct DraftManager {
    drafts: HashMap<Uuid, Draft>,
}

impl DraftManager {
    pub fn init() -> Self {
        Self {
            drafts: HashMap::new(),
        }
    }

    pub fn open(&mut self) -> Uuid {
        let uuid = Uuid::new_v4();
        self.drafts.insert(uuid, Draft::new(uuid));
        debug!("Opened configuration draft {}", uuid);
        uuid
    }

    pub fn get_draft(&self, uuid: &Uuid) -> Option<&Draft> {
        self.drafts.get(uuid)
    }
    pub fn get_draft_mut(&mut self, uuid: &Uuid) -> Option<&mut Draft> {
        self.drafts.get_mut(uuid)
    }

    pub fn discard(&mut self, uuid: &Uuid) -> bool {
        if self.drafts.remove(uuid).is_some() {
            debug!("Discarded configuration draft {}", uuid);
            return true;
        }
        false
    }

    pub fn amount(&self) -> usize {
        self.drafts.len()
    }
}

// Ticking
impl DraftManager {
    pub fn tick(&mut self, config: &Config) -> Result<()> {
        let timeout = config.session_timeout();
        let expired = self
            .drafts
            .values()
            .filter(|draft| draft.idle() > timeout)
            .map(Draft::uuid)
            .collect::<Vec<_>>();
        for uuid in expired {
            self.drafts.remove(&uuid);
            info!("Discarded abandoned configuration draft {}", uuid);
        }
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.drafts.clear();
        Ok(())
    }
}
