use std::collections::HashMap;

use anyhow::Result;
use simplelog::info;
use stored::StoredEgg;
use tokio::fs;

use crate::storage::Storage;

use super::Egg;

/// Read only catalog of the installed eggs.
pub struct EggManager {
    eggs: HashMap<String, Egg>,
}

impl EggManager {
    pub async fn init() -> Result<Self> {
        info!("Loading eggs...");
        let mut eggs = HashMap::new();

        let directory = Storage::eggs_directory();
        if !directory.exists() {
            fs::create_dir_all(&directory).await?;
        }

        for (_, _, name, value) in
            Storage::for_each_content_toml::<StoredEgg>(&directory, "Failed to read egg from file")
                .await?
        {
            info!("Loading egg {}", name);
            eggs.insert(name.clone(), Egg::new_from_stored(&name, value));
        }

        info!("Loaded {} egg(s)", eggs.len());
        Ok(Self { eggs })
    }

    pub fn get_eggs(&self) -> Vec<&Egg> {
        self.eggs.values().collect()
    }

    pub fn has_egg(&self, name: &str) -> bool {
        self.eggs.contains_key(name)
    }

    pub fn get_egg(&self, name: &str) -> Option<&Egg> {
        self.eggs.get(name)
    }
}

impl Egg {
    fn new_from_stored(name: &str, egg: StoredEgg) -> Self {
        let (description, startup, docker_images, variables) = egg.into_parts();
        Self::new(name, &description, &startup, docker_images, variables)
    }
}

pub(super) mod stored {
    use serde::Deserialize;

    use crate::{application::egg::VariableDefinition, storage::LoadFromTomlFile};

    #[derive(Deserialize)]
    pub struct StoredEgg {
        /* Settings */
        #[serde(default)]
        description: String,

        /* Startup */
        startup: String,
        #[serde(default)]
        docker_images: Vec<String>,

        /* Variables */
        #[serde(default)]
        variables: Vec<VariableDefinition>,
    }

    impl StoredEgg {
        pub fn into_parts(self) -> (String, String, Vec<String>, Vec<VariableDefinition>) {
            (
                self.description,
                self.startup,
                self.docker_images,
                self.variables,
            )
        }
    }

    impl LoadFromTomlFile for StoredEgg {}
}

#[cfg(test)]
mod tests {
    use super::stored::StoredEgg;
    use crate::application::egg::Egg;

    #[test]
    fn stored_egg_parses() {
        let egg: StoredEgg = toml::from_str(
            r#"
            description = "A minecraft server"
            startup = "java -jar server.jar --port {{SERVER_PORT}}"
            docker_images = ["ghcr.io/example/java:21"]

            [[variables]]
            env_variable = "QUERY_PORT"
            default_value = "25566"
            rules = "required|port"
            sort = 2
            description = "Port used for queries"

            [[variables]]
            env_variable = "MOTD"
            default_value = "Welcome!"
            rules = "required|string|max:64"
            sort = 1
            description = "Message of the day"
            "#,
        )
        .expect("stored egg should parse");

        let egg = Egg::new_from_stored("minecraft", egg);
        assert_eq!(egg.name(), "minecraft");
        assert_eq!(egg.variables().len(), 2);
        assert!(egg.variables()[0].is_port_bound());
        assert!(!egg.variables()[1].is_port_bound());
        assert_eq!(egg.kebab_name(), "minecraft");
    }
}
