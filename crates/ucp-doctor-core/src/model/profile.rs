//! Typed UCP discovery document (`/.well-known/ucp`).
//!
//! Deserialization is lenient: unknown fields are ignored and most fields are
//! optional, because structural conformance is judged by the schema module
//! before a document is ever turned into these types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The validated discovery document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryProfile {
    pub ucp: UcpCore,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_keys: Option<Vec<SigningKey>>,
}

/// The `ucp` object: protocol version, services, top-level capabilities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UcpCore {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<BTreeMap<String, Service>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<Capability>>,
}

/// A named, versioned feature unit, optionally extending a parent capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Capability {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

impl Capability {
    /// Minimal capability with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Mark this capability as an extension of `parent`.
    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Set the spec and schema URLs.
    pub fn with_urls(mut self, spec: impl Into<String>, schema: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self.schema = Some(schema.into());
        self
    }

    pub fn is_extension(&self) -> bool {
        self.extends.is_some()
    }
}

/// A service definition and its transport bindings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<EndpointBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<EndpointBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a2a: Option<A2aBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<EmbeddedBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<Capability>>,
}

impl Service {
    pub fn has_transport(&self) -> bool {
        self.rest.is_some() || self.mcp.is_some() || self.a2a.is_some() || self.embedded.is_some()
    }
}

/// REST or MCP binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointBinding {
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct A2aBinding {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedBinding {
    pub schema: String,
}

/// The `payment` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Vec<PaymentHandler>>,
}

/// A payment handler definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentHandler {
    pub id: String,
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub handler_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_schemas: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_tokens: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_networks: Option<Vec<String>>,
}

/// Intended usage of a signing key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyUse {
    Sig,
    Enc,
}

/// A public signing key in JWK form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SigningKey {
    pub kid: String,
    pub kty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<KeyUse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl SigningKey {
    /// EC public key from its JWK coordinates.
    pub fn ec(
        kid: impl Into<String>,
        crv: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
    ) -> Self {
        Self {
            kid: kid.into(),
            kty: "EC".to_string(),
            crv: Some(crv.into()),
            x: Some(x.into()),
            y: Some(y.into()),
            ..Self::default()
        }
    }

    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }
}

impl DiscoveryProfile {
    /// Every capability the document declares, top-level first, then inline
    /// service capabilities in service-name order.
    pub fn all_capabilities(&self) -> Vec<Capability> {
        let mut capabilities: Vec<Capability> =
            self.ucp.capabilities.iter().flatten().cloned().collect();
        for service in self.ucp.services.iter().flat_map(|s| s.values()) {
            capabilities.extend(service.capabilities.iter().flatten().cloned());
        }
        capabilities
    }

    /// Services keyed by name (empty when the document declares none).
    pub fn services(&self) -> impl Iterator<Item = (&String, &Service)> {
        self.ucp.services.iter().flat_map(|s| s.iter())
    }

    /// Declared signing keys (empty slice when absent).
    pub fn signing_keys(&self) -> &[SigningKey] {
        self.signing_keys.as_deref().unwrap_or_default()
    }

    /// Declared payment handlers (empty slice when absent).
    pub fn payment_handlers(&self) -> &[PaymentHandler] {
        self.payment
            .as_ref()
            .and_then(|p| p.handlers.as_deref())
            .unwrap_or_default()
    }

    /// Find a capability by name anywhere in the document.
    pub fn find_capability(&self, name: &str) -> Option<Capability> {
        self.all_capabilities().into_iter().find(|c| c.name == name)
    }
}
