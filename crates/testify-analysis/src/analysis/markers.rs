//! Resolved annotation marker names.

use serde::{Deserialize, Serialize};
use testify_core::config::MarkerConfig;

use crate::classfile::annotation::{self, Annotation};

/// Collaborator role carried by a test field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Fake,
    Virtual,
    Real,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fake => "fake",
            Self::Virtual => "virtual",
            Self::Real => "real",
        }
    }
}

/// Marker names with defaults applied, resolved once per analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub sut: String,
    pub fake: String,
    pub virtual_: String,
    pub real: String,
    pub name: String,
    pub config_handler: String,
    pub collaborator_provider: String,
    pub bundle: String,
    pub application: String,
    pub module: String,
    pub scan: String,
    pub local_resource: String,
    pub virtual_resource: String,
    pub remote_resource: String,
    pub constructor: String,
    pub guidelines: Vec<String>,
}

impl Markers {
    pub fn from_config(config: &MarkerConfig) -> Self {
        Self {
            sut: config.effective_sut(),
            fake: config.effective_fake(),
            virtual_: config.effective_virtual(),
            real: config.effective_real(),
            name: config.effective_name(),
            config_handler: config.effective_config_handler(),
            collaborator_provider: config.effective_collaborator_provider(),
            bundle: config.effective_bundle(),
            application: config.effective_application(),
            module: config.effective_module(),
            scan: config.effective_scan(),
            local_resource: config.effective_local_resource(),
            virtual_resource: config.effective_virtual_resource(),
            remote_resource: config.effective_remote_resource(),
            constructor: config.effective_constructor(),
            guidelines: config.guidelines.clone(),
        }
    }

    /// Every role marker present in `annotations`, in fake/virtual/real order.
    pub fn roles(&self, annotations: &[Annotation]) -> Vec<Role> {
        [
            (Role::Fake, &self.fake),
            (Role::Virtual, &self.virtual_),
            (Role::Real, &self.real),
        ]
        .into_iter()
        .filter(|(_, marker)| annotation::find(annotations, marker).is_some())
        .map(|(role, _)| role)
        .collect()
    }

    /// The first role marker present, if any.
    pub fn role(&self, annotations: &[Annotation]) -> Option<Role> {
        self.roles(annotations).into_iter().next()
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::from_config(&MarkerConfig::default())
    }
}
