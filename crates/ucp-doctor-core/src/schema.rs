//! Structural validation of a raw discovery document.
//!
//! The rules are lenient: only the fields below are constrained, unknown
//! fields are ignored. Every problem is collected with its dotted path so a
//! single run reports all structural issues at once.
//!
//! ```text
//! ucp.version                      string, required
//! ucp.services.<name>              { version, spec?, rest?, mcp?, a2a?, embedded?, capabilities? }
//! ucp.capabilities[]               { name, version?, spec?, schema?, extends?, config?{} }
//! payment.handlers[]               { id, name, type?, version?, spec?, config_schema?, ... }
//! signing_keys[]                   { kid, kty, crv?, x?, y?, n?, e?, use?, alg? }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::DiscoveryProfile;

/// Category of a structural issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    TooSmall,
    InvalidEnumValue,
    Custom,
}

/// One structural problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// Dotted path, array indices as numbers (`signing_keys.0.kid`).
    pub path: String,
    pub message: String,
    pub code: IssueCode,
}

/// Validate `value` and, if it conforms, return the typed document.
pub fn validate_profile(value: &Value) -> Result<DiscoveryProfile, Vec<SchemaIssue>> {
    let mut v = Validator::default();
    v.profile(value);
    if !v.issues.is_empty() {
        return Err(v.issues);
    }
    serde_json::from_value(value.clone()).map_err(|e| {
        vec![SchemaIssue {
            path: String::new(),
            message: e.to_string(),
            code: IssueCode::Custom,
        }]
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Object,
    Array,
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Object => "object",
            Kind::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Kind::String, Value::String(_))
                | (Kind::Object, Value::Object(_))
                | (Kind::Array, Value::Array(_))
        )
    }
}

#[derive(Default)]
struct Validator {
    path: Vec<String>,
    issues: Vec<SchemaIssue>,
}

impl Validator {
    fn push_issue(&mut self, code: IssueCode, message: impl Into<String>) {
        self.issues.push(SchemaIssue {
            path: self.path.join("."),
            message: message.into(),
            code,
        });
    }

    fn at<T>(&mut self, segment: impl ToString, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment.to_string());
        let out = f(self);
        self.path.pop();
        out
    }

    /// Check `value` has `kind`; records an issue and returns false otherwise.
    fn expect(&mut self, value: &Value, kind: Kind) -> bool {
        if kind.matches(value) {
            return true;
        }
        self.push_issue(
            IssueCode::InvalidType,
            format!("Expected {}, received {}", kind.name(), type_name(value)),
        );
        false
    }

    /// Validate `obj[key]`. Missing required fields are an issue; missing
    /// optional fields are fine. Returns the value when it has `kind`.
    fn field<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        key: &str,
        kind: Kind,
        required: bool,
    ) -> Option<&'a Value> {
        self.at(key, |v| match obj.get(key) {
            None if required => {
                v.push_issue(IssueCode::InvalidType, "Required");
                None
            }
            None => None,
            Some(value) => v.expect(value, kind).then_some(value),
        })
    }

    fn string_fields(&mut self, obj: &Map<String, Value>, required: &[&str], optional: &[&str]) {
        for key in required {
            self.field(obj, key, Kind::String, true);
        }
        for key in optional {
            self.field(obj, key, Kind::String, false);
        }
    }

    fn profile(&mut self, value: &Value) {
        let Some(root) = value.as_object() else {
            self.expect(value, Kind::Object);
            return;
        };

        if let Some(ucp) = self.field(root, "ucp", Kind::Object, true).and_then(Value::as_object) {
            self.at("ucp", |v| v.ucp(ucp));
        }
        if let Some(payment) = self
            .field(root, "payment", Kind::Object, false)
            .and_then(Value::as_object)
        {
            self.at("payment", |v| v.payment(payment));
        }
        if let Some(keys) = self
            .field(root, "signing_keys", Kind::Array, false)
            .and_then(Value::as_array)
        {
            self.at("signing_keys", |v| {
                for (i, key) in keys.iter().enumerate() {
                    v.at(i, |v| v.signing_key(key));
                }
            });
        }
    }

    fn ucp(&mut self, ucp: &Map<String, Value>) {
        self.field(ucp, "version", Kind::String, true);

        if let Some(services) = self
            .field(ucp, "services", Kind::Object, false)
            .and_then(Value::as_object)
        {
            self.at("services", |v| {
                for (name, service) in services {
                    v.at(name, |v| v.service(service));
                }
            });
        }
        if let Some(caps) = self
            .field(ucp, "capabilities", Kind::Array, false)
            .and_then(Value::as_array)
        {
            self.at("capabilities", |v| v.capabilities(caps));
        }
    }

    fn service(&mut self, value: &Value) {
        if !self.expect(value, Kind::Object) {
            return;
        }
        let Some(service) = value.as_object() else {
            return;
        };
        self.string_fields(service, &["version"], &["spec"]);

        for (binding, required, optional) in [
            ("rest", &["endpoint"][..], &["schema"][..]),
            ("mcp", &["endpoint"][..], &["schema"][..]),
            ("a2a", &["endpoint"][..], &[][..]),
            ("embedded", &["schema"][..], &[][..]),
        ] {
            if let Some(obj) = self
                .field(service, binding, Kind::Object, false)
                .and_then(Value::as_object)
            {
                self.at(binding, |v| v.string_fields(obj, required, optional));
            }
        }

        if let Some(caps) = self
            .field(service, "capabilities", Kind::Array, false)
            .and_then(Value::as_array)
        {
            self.at("capabilities", |v| v.capabilities(caps));
        }
    }

    fn capabilities(&mut self, caps: &[Value]) {
        for (i, cap) in caps.iter().enumerate() {
            self.at(i, |v| {
                if !v.expect(cap, Kind::Object) {
                    return;
                }
                if let Some(obj) = cap.as_object() {
                    v.string_fields(obj, &["name"], &["version", "spec", "schema", "extends"]);
                    v.field(obj, "config", Kind::Object, false);
                }
            });
        }
    }

    fn payment(&mut self, payment: &Map<String, Value>) {
        let Some(handlers) = self
            .field(payment, "handlers", Kind::Array, false)
            .and_then(Value::as_array)
        else {
            return;
        };
        self.at("handlers", |v| {
            for (i, handler) in handlers.iter().enumerate() {
                v.at(i, |v| v.payment_handler(handler));
            }
        });
    }

    fn payment_handler(&mut self, value: &Value) {
        if !self.expect(value, Kind::Object) {
            return;
        }
        let Some(handler) = value.as_object() else {
            return;
        };
        self.string_fields(
            handler,
            &["id", "name"],
            &["type", "version", "spec", "config_schema"],
        );
        self.field(handler, "config", Kind::Object, false);
        for list in ["instrument_schemas", "supported_tokens", "supported_networks"] {
            if let Some(items) = self
                .field(handler, list, Kind::Array, false)
                .and_then(Value::as_array)
            {
                self.at(list, |v| {
                    for (i, item) in items.iter().enumerate() {
                        v.at(i, |v| v.expect(item, Kind::String));
                    }
                });
            }
        }
    }

    fn signing_key(&mut self, value: &Value) {
        if !self.expect(value, Kind::Object) {
            return;
        }
        let Some(key) = value.as_object() else {
            return;
        };

        for (name, label) in [("kid", "Key ID (kid) is required"), ("kty", "Key type (kty) is required")] {
            if let Some(s) = self.field(key, name, Kind::String, true).and_then(Value::as_str) {
                if s.is_empty() {
                    self.at(name, |v| v.push_issue(IssueCode::TooSmall, label));
                }
            }
        }
        self.string_fields(key, &[], &["crv", "x", "y", "n", "e", "alg"]);

        if let Some(key_use) = self.field(key, "use", Kind::String, false).and_then(Value::as_str) {
            if key_use != "sig" && key_use != "enc" {
                self.at("use", |v| {
                    v.push_issue(
                        IssueCode::InvalidEnumValue,
                        format!("Invalid enum value. Expected 'sig' | 'enc', received '{key_use}'"),
                    )
                });
            }
        }

        let has = |k: &str| key.get(k).and_then(Value::as_str).is_some_and(|s| !s.is_empty());
        let complete = match key.get("kty").and_then(Value::as_str) {
            Some("EC") => has("crv") && has("x") && has("y"),
            Some("RSA") => has("n") && has("e"),
            _ => true,
        };
        if !complete {
            self.push_issue(
                IssueCode::Custom,
                "EC keys require crv, x, y; RSA keys require n, e",
            );
        }
    }
}
