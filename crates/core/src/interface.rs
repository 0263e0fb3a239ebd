//! The interface boundary: platform adapters and their registration surface.

use {async_trait::async_trait, serde_json::Value};

use crate::{
    condition::{ConditionPack, ConditionRegistry},
    error::{ConfigError, DeliveryError},
    event::InboundEvent,
    output::OutputBundle,
    property::PropertyRegistry,
};

/// Registration surface handed to [`Interface::describe`].
///
/// Everything registered through it is owned by the describing interface, so
/// duplicate-name errors can report who claimed a name first.
pub struct Registrar<'a> {
    owner: &'a str,
    properties: &'a mut PropertyRegistry,
    conditions: &'a mut ConditionRegistry,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(
        owner: &'a str,
        properties: &'a mut PropertyRegistry,
        conditions: &'a mut ConditionRegistry,
    ) -> Self {
        Self {
            owner,
            properties,
            conditions,
        }
    }

    /// Register an input extractor under `name`.
    pub fn input(
        &mut self,
        name: &str,
        extract: impl Fn(&InboundEvent) -> Value + Send + Sync + 'static,
    ) -> Result<(), ConfigError> {
        self.properties.register_input(self.owner, name, extract)
    }

    /// Declare an output property name responses may write.
    pub fn output(&mut self, name: &str) -> Result<(), ConfigError> {
        self.properties.register_output(self.owner, name)
    }

    /// Register a condition pack.
    pub fn pack(&mut self, pack: ConditionPack) -> Result<(), ConfigError> {
        self.conditions.register(pack)
    }
}

/// External collaborator adapting one messaging platform.
///
/// An interface owns its transport: it receives platform events however the
/// platform delivers them (webhook, long poll, stdin), normalizes each one
/// into an [`InboundEvent`] tagged with its id, and feeds it to
/// [`Core::handle`](crate::Core::handle). At build time it contributes the
/// input extractors, output properties, and condition packs that make its
/// platform's concepts routable; at dispatch time it performs the platform
/// send for every finalized bundle.
#[async_trait]
pub trait Interface: Send + Sync {
    /// Stable id. Events tagged with it are routed back here for delivery.
    fn id(&self) -> &str;

    /// Human-readable name for logs and UIs.
    fn name(&self) -> &str {
        self.id()
    }

    /// Contribute properties and condition packs. Called once, at build
    /// time; a registration error aborts the build.
    fn describe(&self, registrar: &mut Registrar<'_>) -> Result<(), ConfigError>;

    /// Deliver one finalized output bundle to the platform.
    async fn deliver(&self, bundle: &OutputBundle) -> Result<(), DeliveryError>;
}
