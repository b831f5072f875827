//! Annotation marker configuration.
//!
//! Every marker is a fully-qualified annotation type name. Unset markers fall
//! back to the Testify annotation package.

use serde::{Deserialize, Serialize};

use crate::constants::ANNOTATION_PACKAGE;

/// Fully-qualified names of the annotations the analyzers react to.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarkerConfig {
    pub sut: Option<String>,
    pub fake: Option<String>,
    #[serde(rename = "virtual")]
    pub virtual_: Option<String>,
    pub real: Option<String>,
    pub name: Option<String>,
    pub config_handler: Option<String>,
    pub collaborator_provider: Option<String>,
    pub bundle: Option<String>,
    pub application: Option<String>,
    pub module: Option<String>,
    pub scan: Option<String>,
    pub local_resource: Option<String>,
    pub virtual_resource: Option<String>,
    pub remote_resource: Option<String>,
    /// Marks the canonical SUT constructor when several are declared.
    pub constructor: Option<String>,
    /// Guideline marker annotations recorded verbatim on the test descriptor.
    #[serde(default)]
    pub guidelines: Vec<String>,
}

macro_rules! effective_marker {
    ($($(#[$meta:meta])* $fn_name:ident => $field:ident, $simple:literal;)*) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(&self) -> String {
                self.$field
                    .clone()
                    .unwrap_or_else(|| format!("{}.{}", ANNOTATION_PACKAGE, $simple))
            }
        )*

        /// Every configured single-valued marker as `(key, value)` pairs.
        pub fn entries(&self) -> Vec<(&'static str, String)> {
            vec![$((stringify!($field), self.$fn_name()),)*]
        }
    };
}

impl MarkerConfig {
    effective_marker! {
        /// SUT designation marker. Default: `Sut`.
        effective_sut => sut, "Sut";
        /// Fake collaborator marker. Default: `Fake`.
        effective_fake => fake, "Fake";
        /// Virtual (delegating spy) marker. Default: `Virtual`.
        effective_virtual => virtual_, "Virtual";
        /// Real collaborator marker. Default: `Real`.
        effective_real => real, "Real";
        /// Name override marker. Default: `Name`.
        effective_name => name, "Name";
        /// Config handler method marker. Default: `ConfigHandler`.
        effective_config_handler => config_handler, "ConfigHandler";
        /// Collaborator provider method marker. Default: `CollaboratorProvider`.
        effective_collaborator_provider => collaborator_provider, "CollaboratorProvider";
        /// Bundle meta-annotation marker. Default: `Bundle`.
        effective_bundle => bundle, "Bundle";
        /// Application annotation. Default: `Application`.
        effective_application => application, "Application";
        /// Module annotation. Default: `Module`.
        effective_module => module, "Module";
        /// Scan annotation. Default: `Scan`.
        effective_scan => scan, "Scan";
        /// Local resource annotation. Default: `LocalResource`.
        effective_local_resource => local_resource, "LocalResource";
        /// Virtual resource annotation. Default: `VirtualResource`.
        effective_virtual_resource => virtual_resource, "VirtualResource";
        /// Remote resource annotation. Default: `RemoteResource`.
        effective_remote_resource => remote_resource, "RemoteResource";
        /// Canonical constructor marker. Default: `Inject`.
        effective_constructor => constructor, "Inject";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_in_annotation_package() {
        let markers = MarkerConfig::default();
        assert_eq!(markers.effective_sut(), "org.testifyproject.annotation.Sut");
        assert_eq!(markers.effective_virtual(), "org.testifyproject.annotation.Virtual");
    }

    #[test]
    fn explicit_marker_overrides_default() {
        let markers = MarkerConfig {
            fake: Some("com.acme.Mocked".into()),
            ..Default::default()
        };
        assert_eq!(markers.effective_fake(), "com.acme.Mocked");
    }

    #[test]
    fn entries_cover_every_single_marker() {
        let entries = MarkerConfig::default().entries();
        assert_eq!(entries.len(), 15);
        assert!(entries.iter().any(|(k, _)| *k == "virtual_"));
    }
}
