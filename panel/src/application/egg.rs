use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

pub mod manager;

/// A reusable server template.
///
/// Eggs are catalog data. The panel reads them from disk once and
/// provisioning only ever references them.
#[derive(Clone, Getters)]
pub struct Egg {
    /* Settings */
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    description: String,

    /* Startup */
    #[getset(get = "pub")]
    startup: String,
    #[getset(get = "pub")]
    docker_images: Vec<String>,

    /* Variables */
    #[getset(get = "pub")]
    variables: Vec<VariableDefinition>,
}

impl Egg {
    pub fn new(
        name: &str,
        description: &str,
        startup: &str,
        docker_images: Vec<String>,
        variables: Vec<VariableDefinition>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            startup: startup.to_string(),
            docker_images,
            variables,
        }
    }

    /// Default display name for servers created from this egg.
    pub fn kebab_name(&self) -> String {
        common::name::kebab(&self.name)
    }
}

#[derive(Serialize, Deserialize, Clone, Getters, CopyGetters)]
pub struct VariableDefinition {
    #[getset(get = "pub")]
    env_variable: String,
    #[getset(get = "pub")]
    default_value: String,
    #[getset(get = "pub")]
    rules: String,
    #[getset(get_copy = "pub")]
    sort: u32,
    #[getset(get = "pub")]
    description: String,
}

impl VariableDefinition {
    pub fn new(
        env_variable: &str,
        default_value: &str,
        rules: &str,
        sort: u32,
        description: &str,
    ) -> Self {
        Self {
            env_variable: env_variable.to_string(),
            default_value: default_value.to_string(),
            rules: rules.to_string(),
            sort,
            description: description.to_string(),
        }
    }

    /// A variable is port bound when its rule string carries the `port`
    /// marker. Its value then comes from the port assignments instead of the
    /// variable form.
    pub fn is_port_bound(&self) -> bool {
        self.rules.contains("port")
    }
}
