use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use getset::{CopyGetters, Getters};
use uuid::Uuid;

use crate::application::{
    egg::Egg,
    server::{manager::CreationError, FeatureLimits, Resources, Specification},
};

use self::{
    assignment::{AssignError, Assignments},
    limits::{LimitError, LimitKind, Limits, SwapMode},
    ports::PortSet,
    rules::{check_variable, RuleEvaluator},
    variables::ResolvedVariables,
};

pub mod assignment;
pub mod limits;
pub mod manager;
pub mod ports;
pub mod rules;
pub mod variables;

pub const MAX_NAME_LENGTH: usize = 191;

/// Sentinel entry of the image dropdown that switches to free text entry.
pub const CUSTOM_IMAGE: &str = "ghcr.io/custom-image";

/// One in-progress provisioning session.
///
/// Every edit arrives as a [`DraftEvent`] and is folded into the draft
/// synchronously, recomputing whatever derives from it. The draft lives
/// until it is submitted or abandoned.
pub struct Draft {
    /* Session */
    uuid: Uuid,
    touched: Instant,

    /* Selection */
    egg: Option<Egg>,
    node: Option<String>,
    owner: Option<String>,
    name: String,
    description: String,

    /* Startup and variables */
    startup: String,
    resolved: ResolvedVariables,
    environment: BTreeMap<String, String>,

    /* Ports */
    port_tokens: Vec<String>,
    ports: PortSet,
    assignments: Assignments,

    /* Limits */
    limits: Limits,

    /* Docker */
    image: ImageChoice,
    labels: BTreeMap<String, String>,

    /* Features */
    feature_limits: FeatureLimits,
    additional_allocations: Vec<String>,
    start_on_completion: bool,
}

pub enum DraftEvent {
    SelectEgg(Egg),
    SetName(String),
    SetDescription(String),
    SelectNode(String),
    SelectOwner(String),
    SetPortTokens(Vec<String>),
    SetStartup(String),
    AssignPort {
        variable: String,
        port: Option<u16>,
    },
    SetVariable {
        variable: String,
        value: String,
    },
    ToggleLimit {
        kind: LimitKind,
        unlimited: bool,
    },
    SetLimit {
        kind: LimitKind,
        value: u32,
    },
    SetSwapMode(SwapMode),
    SetSwap(i64),
    SetOomKill(bool),
    SelectImage(String),
    SetImage(String),
    SetLabels(BTreeMap<String, String>),
    SetFeatureLimits(FeatureLimits),
    SetAdditionalAllocations(Vec<String>),
    SetStartOnCompletion(bool),
}

impl Draft {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            touched: Instant::now(),
            egg: None,
            node: None,
            owner: None,
            name: String::new(),
            description: String::new(),
            startup: String::new(),
            resolved: ResolvedVariables::default(),
            environment: BTreeMap::new(),
            port_tokens: Vec::new(),
            ports: PortSet::default(),
            assignments: Assignments::default(),
            limits: Limits::default(),
            image: ImageChoice::default(),
            labels: BTreeMap::new(),
            feature_limits: FeatureLimits::default(),
            additional_allocations: Vec::new(),
            start_on_completion: true,
        }
    }

    /// Folds one edit into the draft. Derived state is recomputed before
    /// this returns, there is no deferred reactivity.
    pub fn apply(&mut self, event: DraftEvent) -> Result<(), DraftError> {
        self.touched = Instant::now();
        match event {
            DraftEvent::SelectEgg(egg) => {
                self.select_egg(egg);
                Ok(())
            }
            DraftEvent::SetName(name) => {
                self.name = name;
                Ok(())
            }
            DraftEvent::SetDescription(description) => {
                self.description = description;
                Ok(())
            }
            DraftEvent::SelectNode(node) => {
                self.node = Some(node);
                Ok(())
            }
            DraftEvent::SelectOwner(owner) => {
                self.owner = Some(owner);
                Ok(())
            }
            DraftEvent::SetPortTokens(tokens) => {
                self.ports = PortSet::parse(&tokens);
                self.port_tokens = tokens;
                Ok(())
            }
            DraftEvent::SetStartup(startup) => {
                self.startup = startup;
                self.reset_variables();
                Ok(())
            }
            DraftEvent::AssignPort { variable, port } => {
                self.assignments.assign(&variable, port, &self.ports)?;
                match port {
                    Some(port) => {
                        self.environment.insert(variable, port.to_string());
                    }
                    None => {
                        self.environment.remove(&variable);
                    }
                }
                Ok(())
            }
            DraftEvent::SetVariable { variable, value } => {
                let definition = self
                    .resolved
                    .find_free(&variable)
                    .ok_or(DraftError::UnknownVariable(variable.clone()))?
                    .definition();
                self.environment
                    .insert(definition.env_variable().clone(), value);
                Ok(())
            }
            DraftEvent::ToggleLimit { kind, unlimited } => {
                self.limits.toggle(kind, unlimited);
                Ok(())
            }
            DraftEvent::SetLimit { kind, value } => {
                self.limits.set_value(kind, value)?;
                Ok(())
            }
            DraftEvent::SetSwapMode(mode) => {
                self.limits.set_swap_mode(mode);
                Ok(())
            }
            DraftEvent::SetSwap(value) => {
                self.limits.set_swap(value)?;
                Ok(())
            }
            DraftEvent::SetOomKill(enabled) => {
                self.limits.set_oom_kill(enabled);
                Ok(())
            }
            DraftEvent::SelectImage(choice) => {
                self.image.select(&choice);
                Ok(())
            }
            DraftEvent::SetImage(image) => {
                let images = self
                    .egg
                    .as_ref()
                    .map(|egg| egg.docker_images().as_slice())
                    .unwrap_or_default();
                self.image.set_image(&image, images);
                Ok(())
            }
            DraftEvent::SetLabels(labels) => {
                self.labels = labels;
                Ok(())
            }
            DraftEvent::SetFeatureLimits(feature_limits) => {
                self.feature_limits = feature_limits;
                Ok(())
            }
            DraftEvent::SetAdditionalAllocations(allocations) => {
                self.additional_allocations = allocations;
                Ok(())
            }
            DraftEvent::SetStartOnCompletion(start) => {
                self.start_on_completion = start;
                Ok(())
            }
        }
    }

    fn select_egg(&mut self, egg: Egg) {
        let previous = self.egg.take();

        self.startup = egg.startup().clone();
        self.image = ImageChoice::reset(egg.docker_images());

        // Keep a hand picked name, replace an empty one or the default of
        // the previously selected egg
        let previous_default = previous.map(|egg| egg.kebab_name());
        if self.name.is_empty() || previous_default.as_deref() == Some(self.name.as_str()) {
            self.name = egg.kebab_name();
        }

        self.egg = Some(egg);
        self.reset_variables();
    }

    /// Rebuilds everything derived from the egg and the startup command:
    /// the variable split, the seeded port pool, the assignment slots and
    /// the environment mapping.
    fn reset_variables(&mut self) {
        self.environment = BTreeMap::new();
        match &self.egg {
            Some(egg) => {
                self.resolved = ResolvedVariables::resolve(egg, &self.startup);
                self.ports = PortSet::seed(&self.resolved.default_ports());
                self.port_tokens = self
                    .ports
                    .as_slice()
                    .iter()
                    .map(|port| port.to_string())
                    .collect();
                self.assignments = Assignments::reset(self.resolved.port_slots(), &self.ports);

                for variable in self.resolved.free_variables() {
                    self.environment.insert(
                        variable.definition().env_variable().clone(),
                        variable.definition().default_value().clone(),
                    );
                }
                for entry in self.assignments.entries() {
                    if let Some(port) = entry.port() {
                        self.environment
                            .insert(entry.variable().to_string(), port.to_string());
                    }
                }
            }
            None => {
                self.resolved = ResolvedVariables::default();
                self.ports = PortSet::default();
                self.port_tokens = Vec::new();
                self.assignments = Assignments::default();
            }
        }
    }

    /// Field level messages of the validation gate, one entry per free
    /// variable whose current value violates its rules.
    pub fn validation_messages(&self, evaluator: &dyn RuleEvaluator) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for variable in self.resolved.free_variables() {
            let definition = variable.definition();
            let value = self
                .environment
                .get(definition.env_variable())
                .cloned()
                .unwrap_or_default();
            if let Some(message) = check_variable(
                variable.kind(),
                definition.env_variable(),
                definition.rules(),
                &value,
                evaluator,
            ) {
                errors.push(FieldError {
                    variable: definition.env_variable().clone(),
                    message,
                });
            }
        }
        errors
    }

    /// Runs the validation pass and assembles the configuration payload.
    ///
    /// Stale assignments are unset here, every port bound variable has to
    /// end up with a port and every free variable has to pass the gate.
    pub fn build_payload(
        &mut self,
        evaluator: &dyn RuleEvaluator,
    ) -> Result<ServerConfigurationPayload, SubmitError> {
        let egg = self.egg.as_ref().ok_or(SubmitError::MissingEgg)?;
        let node = self.node.clone().ok_or(SubmitError::MissingNode)?;
        let owner = self.owner.clone().ok_or(SubmitError::MissingOwner)?;
        if self.name.is_empty() {
            return Err(SubmitError::MissingName);
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(SubmitError::NameTooLong);
        }

        for variable in self.assignments.sweep(&self.ports) {
            self.environment.remove(&variable);
        }
        if let Some(entry) = self
            .assignments
            .entries()
            .iter()
            .find(|entry| entry.port().is_none())
        {
            return Err(SubmitError::UnassignedPort(entry.variable().to_string()));
        }

        let errors = self.validation_messages(evaluator);
        if !errors.is_empty() {
            return Err(SubmitError::Validation(errors));
        }

        // The environment mapping the creation service consumes as-is
        let mut environment = BTreeMap::new();
        for variable in self.resolved.free_variables() {
            let key = variable.definition().env_variable();
            environment.insert(
                key.clone(),
                self.environment.get(key).cloned().unwrap_or_default(),
            );
        }
        let mut assignments = Vec::new();
        for entry in self.assignments.entries() {
            let port = entry
                .port()
                .expect("Unassigned slot survived the validation pass");
            environment.insert(entry.variable().to_string(), port.to_string());
            assignments.push((entry.variable().to_string(), port));
        }

        let additional_allocations = self
            .additional_allocations
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .cloned()
            .collect();

        Ok(ServerConfigurationPayload {
            egg: egg.name().clone(),
            node,
            owner,
            name: self.name.clone(),
            description: self.description.clone(),
            ports: self.ports.to_vec(),
            assignments,
            environment,
            resources: self.limits.to_resources(),
            image: self.image.image().to_string(),
            startup: self.startup.clone(),
            labels: self.labels.clone(),
            feature_limits: self.feature_limits.clone(),
            additional_allocations,
            start_on_completion: self.start_on_completion,
        })
    }

    /// Hands the finished payload to the creation service. The draft stays
    /// alive when the service fails so the user can retry.
    pub async fn submit(
        &mut self,
        evaluator: &(dyn RuleEvaluator + Sync),
        service: &mut (dyn CreationService + Send),
    ) -> Result<Uuid, SubmitError> {
        let payload = self.build_payload(evaluator)?;
        service
            .create(&payload)
            .await
            .map_err(SubmitError::Creation)
    }

    pub fn idle(&self) -> Duration {
        self.touched.elapsed()
    }
}

// Read access for the admin views
impl Draft {
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
    pub fn egg(&self) -> Option<&Egg> {
        self.egg.as_ref()
    }
    pub fn node(&self) -> Option<&String> {
        self.node.as_ref()
    }
    pub fn owner(&self) -> Option<&String> {
        self.owner.as_ref()
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn startup(&self) -> &str {
        &self.startup
    }
    pub fn port_tokens(&self) -> &[String] {
        &self.port_tokens
    }
    pub fn ports(&self) -> &PortSet {
        &self.ports
    }
    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }
    pub fn resolved(&self) -> &ResolvedVariables {
        &self.resolved
    }
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
    pub fn image(&self) -> &ImageChoice {
        &self.image
    }
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }
    pub fn feature_limits(&self) -> &FeatureLimits {
        &self.feature_limits
    }
    pub fn start_on_completion(&self) -> bool {
        self.start_on_completion
    }
}

/// Image dropdown state. Picking a known image mirrors it into the text
/// field, typing an unknown one flips the dropdown to the custom entry.
#[derive(Default)]
pub struct ImageChoice {
    selected: String,
    image: String,
}

impl ImageChoice {
    fn reset(images: &[String]) -> Self {
        let image = images.first().cloned().unwrap_or_default();
        Self {
            selected: image.clone(),
            image,
        }
    }

    fn select(&mut self, choice: &str) {
        self.selected = choice.to_string();
        self.image = choice.to_string();
    }

    fn set_image(&mut self, image: &str, images: &[String]) {
        self.image = image.to_string();
        self.selected = if images.iter().any(|known| known == image) {
            image.to_string()
        } else {
            CUSTOM_IMAGE.to_string()
        };
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }
    pub fn image(&self) -> &str {
        &self.image
    }
}

/// Everything the creation service needs to provision the server. Built
/// once per submission and not mutated afterwards.
#[derive(Clone, Getters, CopyGetters)]
pub struct ServerConfigurationPayload {
    /* Where */
    #[getset(get = "pub")]
    egg: String,
    #[getset(get = "pub")]
    node: String,
    #[getset(get = "pub")]
    owner: String,

    /* Identity */
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    description: String,

    /* Network */
    #[getset(get = "pub")]
    ports: Vec<u16>,
    #[getset(get = "pub")]
    assignments: Vec<(String, u16)>,

    /* How */
    #[getset(get = "pub")]
    environment: BTreeMap<String, String>,
    #[getset(get = "pub")]
    resources: Resources,
    #[getset(get = "pub")]
    image: String,
    #[getset(get = "pub")]
    startup: String,
    #[getset(get = "pub")]
    labels: BTreeMap<String, String>,
    #[getset(get = "pub")]
    feature_limits: FeatureLimits,
    #[getset(get = "pub")]
    additional_allocations: Vec<String>,
    #[getset(get_copy = "pub")]
    start_on_completion: bool,
}

impl ServerConfigurationPayload {
    pub fn spec(&self) -> Specification {
        Specification::new(
            self.image.clone(),
            self.startup.clone(),
            self.environment.clone(),
            self.labels.clone(),
            self.feature_limits.clone(),
        )
    }
}

/// Opaque collaborator that turns a payload into a real server.
#[async_trait]
pub trait CreationService {
    async fn create(
        &mut self,
        payload: &ServerConfigurationPayload,
    ) -> Result<Uuid, CreationError>;
}

#[derive(Debug, Getters)]
pub struct FieldError {
    #[getset(get = "pub")]
    variable: String,
    #[getset(get = "pub")]
    message: String,
}

#[derive(Debug)]
pub enum DraftError {
    UnknownVariable(String),
    Assign(AssignError),
    Limit(LimitError),
}

impl From<AssignError> for DraftError {
    fn from(error: AssignError) -> Self {
        DraftError::Assign(error)
    }
}

impl From<LimitError> for DraftError {
    fn from(error: LimitError) -> Self {
        DraftError::Limit(error)
    }
}

impl Display for DraftError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftError::UnknownVariable(variable) => {
                write!(formatter, "The egg has no variable named {}", variable)
            }
            DraftError::Assign(error) => write!(formatter, "{}", error),
            DraftError::Limit(error) => write!(formatter, "{}", error),
        }
    }
}

#[derive(Debug)]
pub enum SubmitError {
    MissingEgg,
    MissingNode,
    MissingOwner,
    MissingName,
    NameTooLong,
    UnassignedPort(String),
    Validation(Vec<FieldError>),
    Creation(CreationError),
}

impl Display for SubmitError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::MissingEgg => write!(formatter, "No egg has been selected"),
            SubmitError::MissingNode => write!(formatter, "No node has been selected"),
            SubmitError::MissingOwner => write!(formatter, "No owner has been selected"),
            SubmitError::MissingName => write!(formatter, "The server needs a name"),
            SubmitError::NameTooLong => write!(
                formatter,
                "The server name must not be longer than {} characters",
                MAX_NAME_LENGTH
            ),
            SubmitError::UnassignedPort(variable) => {
                write!(formatter, "No port has been assigned to {}", variable)
            }
            SubmitError::Validation(errors) => {
                write!(formatter, "{} field(s) failed validation", errors.len())
            }
            SubmitError::Creation(error) => write!(formatter, "{}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::application::{
        egg::{Egg, VariableDefinition},
        server::manager::CreationError,
    };

    use super::{
        rules::BasicRuleEvaluator, CreationService, Draft, DraftEvent, ServerConfigurationPayload,
        SubmitError, CUSTOM_IMAGE,
    };

    fn egg() -> Egg {
        Egg::new(
            "Test Egg",
            "An egg for tests",
            "./start --port {{SERVER_PORT}}",
            vec![
                "ghcr.io/example/game:1".to_string(),
                "ghcr.io/example/game:2".to_string(),
            ],
            vec![
                VariableDefinition::new("QUERY_PORT", "25566", "required|port", 1, ""),
                VariableDefinition::new(
                    "MODE",
                    "survival",
                    "required|in:survival,creative",
                    2,
                    "",
                ),
                VariableDefinition::new("MOTD", "Welcome!", "required|string|max:64", 3, ""),
            ],
        )
    }

    fn draft_with_egg() -> Draft {
        let mut draft = Draft::new(Uuid::new_v4());
        draft.apply(DraftEvent::SelectEgg(egg())).unwrap();
        draft
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    struct RecordingService {
        payload: Option<ServerConfigurationPayload>,
        fail: bool,
    }

    impl RecordingService {
        fn new(fail: bool) -> Self {
            Self {
                payload: None,
                fail,
            }
        }
    }

    #[async_trait]
    impl CreationService for RecordingService {
        async fn create(
            &mut self,
            payload: &ServerConfigurationPayload,
        ) -> Result<Uuid, CreationError> {
            if self.fail {
                return Err(CreationError::NodeNotActive);
            }
            self.payload = Some(payload.clone());
            Ok(Uuid::new_v4())
        }
    }

    #[test]
    fn selecting_an_egg_derives_the_defaults() {
        let draft = draft_with_egg();

        assert_eq!(draft.name(), "test-egg");
        assert_eq!(draft.startup(), "./start --port {{SERVER_PORT}}");
        assert_eq!(draft.image().image(), "ghcr.io/example/game:1");
        assert_eq!(draft.ports().as_slice(), &[25566]);
        assert_eq!(draft.assignments().get("SERVER_PORT"), Some(None));
        assert_eq!(draft.assignments().get("QUERY_PORT"), Some(Some(25566)));
        assert_eq!(
            draft.environment().get("QUERY_PORT"),
            Some(&"25566".to_string())
        );
        assert_eq!(
            draft.environment().get("MODE"),
            Some(&"survival".to_string())
        );
        assert!(!draft.environment().contains_key("SERVER_PORT"));
    }

    #[test]
    fn hand_picked_names_survive_an_egg_change() {
        let mut draft = draft_with_egg();
        draft
            .apply(DraftEvent::SetName("my-server".to_string()))
            .unwrap();
        draft.apply(DraftEvent::SelectEgg(egg())).unwrap();
        assert_eq!(draft.name(), "my-server");

        // The untouched default follows the egg
        let mut draft = draft_with_egg();
        let other = Egg::new("Other Egg", "", "run", Vec::new(), Vec::new());
        draft.apply(DraftEvent::SelectEgg(other)).unwrap();
        assert_eq!(draft.name(), "other-egg");
    }

    #[test]
    fn port_tokens_replace_the_pool() {
        let mut draft = draft_with_egg();
        draft
            .apply(DraftEvent::SetPortTokens(tokens(&[
                "25565",
                "8080",
                "1337-1340",
            ])))
            .unwrap();
        assert_eq!(
            draft.ports().as_slice(),
            &[25565, 8080, 1337, 1338, 1339, 1340]
        );
    }

    #[test]
    fn assigning_a_port_updates_the_environment() {
        let mut draft = draft_with_egg();
        draft
            .apply(DraftEvent::SetPortTokens(tokens(&["25565", "25566"])))
            .unwrap();
        draft
            .apply(DraftEvent::AssignPort {
                variable: "SERVER_PORT".to_string(),
                port: Some(25565),
            })
            .unwrap();
        assert_eq!(
            draft.environment().get("SERVER_PORT"),
            Some(&"25565".to_string())
        );

        draft
            .apply(DraftEvent::AssignPort {
                variable: "SERVER_PORT".to_string(),
                port: None,
            })
            .unwrap();
        assert!(!draft.environment().contains_key("SERVER_PORT"));
    }

    #[test]
    fn editing_the_startup_rebuilds_the_slots() {
        let mut draft = draft_with_egg();
        draft
            .apply(DraftEvent::SetStartup("./start --offline".to_string()))
            .unwrap();
        assert_eq!(draft.assignments().get("SERVER_PORT"), None);
        assert_eq!(draft.assignments().get("QUERY_PORT"), Some(Some(25566)));
    }

    #[test]
    fn unknown_images_flip_to_the_custom_entry() {
        let mut draft = draft_with_egg();
        draft
            .apply(DraftEvent::SetImage("ghcr.io/else/image:3".to_string()))
            .unwrap();
        assert_eq!(draft.image().selected(), CUSTOM_IMAGE);
        assert_eq!(draft.image().image(), "ghcr.io/else/image:3");

        draft
            .apply(DraftEvent::SetImage("ghcr.io/example/game:2".to_string()))
            .unwrap();
        assert_eq!(draft.image().selected(), "ghcr.io/example/game:2");
    }

    fn ready_draft() -> Draft {
        let mut draft = draft_with_egg();
        draft
            .apply(DraftEvent::SelectNode("node01".to_string()))
            .unwrap();
        draft
            .apply(DraftEvent::SelectOwner("admin".to_string()))
            .unwrap();
        draft
            .apply(DraftEvent::SetPortTokens(tokens(&["25565", "25566"])))
            .unwrap();
        draft
            .apply(DraftEvent::AssignPort {
                variable: "SERVER_PORT".to_string(),
                port: Some(25565),
            })
            .unwrap();
        draft
            .apply(DraftEvent::AssignPort {
                variable: "QUERY_PORT".to_string(),
                port: Some(25566),
            })
            .unwrap();
        draft
    }

    #[tokio::test]
    async fn submission_builds_the_full_payload() {
        let mut draft = ready_draft();
        draft
            .apply(DraftEvent::SetAdditionalAllocations(tokens(&[
                "",
                "1.2.3.4",
                "  ",
            ])))
            .unwrap();

        let mut service = RecordingService::new(false);
        draft
            .submit(&BasicRuleEvaluator, &mut service)
            .await
            .expect("submission should succeed");

        let payload = service.payload.expect("service saw the payload");
        assert_eq!(payload.egg(), "Test Egg");
        assert_eq!(payload.node(), "node01");
        assert_eq!(payload.owner(), "admin");
        assert_eq!(payload.ports(), &vec![25565, 25566]);
        assert_eq!(
            payload.assignments(),
            &vec![
                ("SERVER_PORT".to_string(), 25565),
                ("QUERY_PORT".to_string(), 25566)
            ]
        );
        assert_eq!(
            payload.environment().get("SERVER_PORT"),
            Some(&"25565".to_string())
        );
        assert_eq!(
            payload.environment().get("MOTD"),
            Some(&"Welcome!".to_string())
        );
        assert_eq!(
            payload.additional_allocations(),
            &vec!["1.2.3.4".to_string()]
        );
        assert_eq!(payload.resources().io(), 500);
        assert!(payload.start_on_completion());
    }

    #[tokio::test]
    async fn unassigned_slots_block_the_submission() {
        let mut draft = ready_draft();
        // Shrinking the pool leaves QUERY_PORT with a stale binding
        draft
            .apply(DraftEvent::SetPortTokens(tokens(&["25565"])))
            .unwrap();

        let mut service = RecordingService::new(false);
        let error = draft
            .submit(&BasicRuleEvaluator, &mut service)
            .await
            .expect_err("stale binding has to block");
        assert!(matches!(error, SubmitError::UnassignedPort(variable) if variable == "QUERY_PORT"));
        assert!(!draft.environment().contains_key("QUERY_PORT"));
    }

    #[tokio::test]
    async fn rule_violations_block_the_submission() {
        let mut draft = ready_draft();
        draft
            .apply(DraftEvent::SetVariable {
                variable: "MODE".to_string(),
                value: "peaceful".to_string(),
            })
            .unwrap();

        let mut service = RecordingService::new(false);
        let error = draft
            .submit(&BasicRuleEvaluator, &mut service)
            .await
            .expect_err("invalid enumeration value has to block");
        match error {
            SubmitError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].variable(), "MODE");
                assert!(errors[0].message().contains("MODE"));
            }
            _ => panic!("Expected a validation error"),
        }
    }

    #[tokio::test]
    async fn a_failing_creation_service_keeps_the_draft() {
        let mut draft = ready_draft();

        let mut failing = RecordingService::new(true);
        let error = draft
            .submit(&BasicRuleEvaluator, &mut failing)
            .await
            .expect_err("service failure surfaces");
        assert!(matches!(error, SubmitError::Creation(_)));

        // The session survived, a retry succeeds
        let mut service = RecordingService::new(false);
        draft
            .submit(&BasicRuleEvaluator, &mut service)
            .await
            .expect("retry should succeed");
    }

    #[tokio::test]
    async fn submission_requires_the_selections() {
        let mut draft = Draft::new(Uuid::new_v4());
        let mut service = RecordingService::new(false);
        assert!(matches!(
            draft.submit(&BasicRuleEvaluator, &mut service).await,
            Err(SubmitError::MissingEgg)
        ));

        draft.apply(DraftEvent::SelectEgg(egg())).unwrap();
        assert!(matches!(
            draft.submit(&BasicRuleEvaluator, &mut service).await,
            Err(SubmitError::MissingNode)
        ));
    }

    #[test]
    fn labels_and_feature_limits_are_plain_state() {
        let mut draft = draft_with_egg();
        let mut labels = BTreeMap::new();
        labels.insert("team".to_string(), "blue".to_string());
        draft.apply(DraftEvent::SetLabels(labels)).unwrap();
        assert_eq!(draft.labels().get("team"), Some(&"blue".to_string()));
    }
}
