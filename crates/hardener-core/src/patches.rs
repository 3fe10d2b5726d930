//! Deterministic, rule-based correction.
//!
//! Applies a fixed set of structural edits directly on the parsed document:
//! required sections, default security schemes, shared error schemas and
//! standard error responses for every operation. Every edit only fills in
//! what is missing (or upgrades `http://` server URLs), so re-applying the
//! patch set to its own output changes nothing.

use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};

use crate::artifact::{Artifact, ValidationError};

/// Operation keys inside an OpenAPI path item.
const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";

fn static_yaml(source: &str) -> Value {
    serde_yaml::from_str(source).unwrap()
}

lazy_static! {
    static ref DEFAULT_SERVER: Value = static_yaml(r#"
url: "https://api.example.corp/v1"
"#);

    static ref DEFAULT_CONTACT: Value = static_yaml(r#"
name: "API Support"
email: "api-support@example.corp"
url: "https://support.example.corp"
"#);

    static ref DEFAULT_LICENSE: Value = static_yaml(r#"
name: "Proprietary"
url: "https://example.corp/license"
"#);

    static ref API_KEY_SCHEME: Value = static_yaml(r#"
type: apiKey
in: header
name: X-API-Key
description: "API key for authentication"
"#);

    static ref OAUTH2_SCHEME: Value = static_yaml(r#"
type: oauth2
description: "OAuth2 authentication"
flows:
  authorizationCode:
    authorizationUrl: "https://auth.example.corp/oauth/authorize"
    tokenUrl: "https://auth.example.corp/oauth/token"
    scopes:
      read: "Read access"
      write: "Write access"
      admin: "Administrative access"
"#);

    static ref GLOBAL_SECURITY: Value = static_yaml(r#"
- apiKeyAuth: []
- oauth2Auth: ["read"]
"#);

    static ref OPERATION_SECURITY: Value = static_yaml(r#"
- apiKeyAuth: []
"#);

    static ref ERROR_SCHEMA: Value = static_yaml(r#"
type: object
required: ["code", "message"]
properties:
  code:
    type: string
    description: "Error code"
  message:
    type: string
    description: "Error message"
  details:
    type: object
    description: "Additional error details"
example:
  code: "VALIDATION_ERROR"
  message: "Invalid request parameters"
  details: {}
"#);

    static ref RATE_LIMIT_ERROR_SCHEMA: Value = static_yaml(r#"
type: object
required: ["code", "message", "retry_after"]
properties:
  code:
    type: string
    example: "RATE_LIMIT_EXCEEDED"
  message:
    type: string
    example: "Rate limit exceeded"
  retry_after:
    type: integer
    example: 60
"#);

    // Status code -> response body, in the order they are added.
    static ref ERROR_RESPONSES: Vec<(&'static str, Value)> = vec![
        ("400", error_response("Bad Request - Invalid request parameters")),
        ("401", error_response("Unauthorized - Invalid or missing authentication")),
        ("403", error_response("Forbidden - Insufficient permissions")),
        ("429", static_yaml(r##"
description: "Too Many Requests - Rate limit exceeded"
headers:
  X-RateLimit-Limit:
    description: "Request limit per time window"
    schema:
      type: integer
  X-RateLimit-Remaining:
    description: "Remaining requests in current window"
    schema:
      type: integer
  X-RateLimit-Reset:
    description: "Time when rate limit resets"
    schema:
      type: integer
content:
  application/json:
    schema:
      $ref: "#/components/schemas/RateLimitError"
"##)),
        ("500", error_response("Internal Server Error")),
    ];
}

fn error_response(description: &str) -> Value {
    let mut response = static_yaml(
        r##"
content:
  application/json:
    schema:
      $ref: "#/components/schemas/Error"
"##,
    );
    if let Some(map) = response.as_mapping_mut() {
        map.insert(Value::from("description"), Value::from(description));
    }
    response
}

fn empty_mapping() -> Value {
    Value::Mapping(Mapping::new())
}

/// Insert `default` under `key` unless the key is already present.
fn set_default<'a>(map: &'a mut Mapping, key: &str, default: Value) -> &'a mut Value {
    map.entry(Value::from(key)).or_insert(default)
}

/// Whether a responses map already declares `code`, as a string or integer key.
fn has_status(responses: &Mapping, code: &str) -> bool {
    let numeric = code.parse::<u64>().ok();
    responses
        .keys()
        .any(|k| k.as_str() == Some(code) || (numeric.is_some() && k.as_u64() == numeric))
}

/// The deterministic correction strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicPatcher;

impl DeterministicPatcher {
    pub fn new() -> Self {
        Self
    }

    /// Patch `artifact` and return the result as its next version.
    ///
    /// The input has already passed validation and every edit preserves the
    /// structural schema, so the error path is not expected in practice.
    pub fn apply(&self, artifact: &Artifact) -> Result<Artifact, ValidationError> {
        let mut document = artifact.document().clone();
        self.patch_document(&mut document);
        artifact.from_document(document)
    }

    /// Apply every edit in place. Non-mapping documents are left alone.
    pub fn patch_document(&self, document: &mut Value) {
        let Some(root) = document.as_mapping_mut() else {
            return;
        };

        ensure_openapi_version(root);
        ensure_servers(root);
        ensure_info(root);
        ensure_components(root);
        set_default(root, "security", GLOBAL_SECURITY.clone());
        ensure_operations(root);
    }
}

fn ensure_openapi_version(root: &mut Mapping) {
    let is_v3 = root
        .get("openapi")
        .and_then(Value::as_str)
        .map(|v| v.starts_with("3."))
        .unwrap_or(false);

    if !is_v3 {
        root.insert(Value::from("openapi"), Value::from(DEFAULT_OPENAPI_VERSION));
    }
}

fn ensure_servers(root: &mut Mapping) {
    let servers = set_default(root, "servers", Value::Sequence(Vec::new()));
    let Some(servers) = servers.as_sequence_mut() else {
        return;
    };

    if servers.is_empty() {
        servers.push(DEFAULT_SERVER.clone());
        return;
    }

    for server in servers.iter_mut() {
        let Some(url) = server.get_mut("url") else {
            continue;
        };
        let upgraded = url
            .as_str()
            .and_then(|u| u.strip_prefix("http://"))
            .map(|rest| format!("https://{}", rest));
        if let Some(upgraded) = upgraded {
            *url = Value::from(upgraded);
        }
    }
}

fn ensure_info(root: &mut Mapping) {
    let info = set_default(root, "info", empty_mapping());
    let Some(info) = info.as_mapping_mut() else {
        return;
    };

    set_default(info, "title", Value::from("API"));
    set_default(info, "version", Value::from("1.0.0"));
    set_default(
        info,
        "description",
        Value::from("API specification hardened with security best practices"),
    );
    set_default(info, "contact", DEFAULT_CONTACT.clone());
    set_default(info, "license", DEFAULT_LICENSE.clone());
    set_default(info, "termsOfService", Value::from("https://example.corp/terms"));
}

fn ensure_components(root: &mut Mapping) {
    let components = set_default(root, "components", empty_mapping());
    let Some(components) = components.as_mapping_mut() else {
        return;
    };

    if let Some(schemes) = set_default(components, "securitySchemes", empty_mapping()).as_mapping_mut() {
        set_default(schemes, "apiKeyAuth", API_KEY_SCHEME.clone());
        set_default(schemes, "oauth2Auth", OAUTH2_SCHEME.clone());
    }

    if let Some(schemas) = set_default(components, "schemas", empty_mapping()).as_mapping_mut() {
        set_default(schemas, "Error", ERROR_SCHEMA.clone());
        set_default(schemas, "RateLimitError", RATE_LIMIT_ERROR_SCHEMA.clone());
    }
}

fn ensure_operations(root: &mut Mapping) {
    let paths = set_default(root, "paths", empty_mapping());
    let Some(paths) = paths.as_mapping_mut() else {
        return;
    };

    for (path_key, item) in paths.iter_mut() {
        let (Some(path), Some(item)) = (path_key.as_str(), item.as_mapping_mut()) else {
            continue;
        };

        for (method_key, operation) in item.iter_mut() {
            let Some(method) = method_key.as_str() else {
                continue;
            };
            if !HTTP_METHODS.contains(&method) {
                continue;
            }
            if let Some(operation) = operation.as_mapping_mut() {
                patch_operation(path, method, operation);
            }
        }
    }
}

fn patch_operation(path: &str, method: &str, operation: &mut Mapping) {
    if let Some(responses) = set_default(operation, "responses", empty_mapping()).as_mapping_mut() {
        for (code, response) in ERROR_RESPONSES.iter() {
            if !has_status(responses, code) {
                responses.insert(Value::from(*code), response.clone());
            }
        }
    }

    set_default(
        operation,
        "description",
        Value::from(format!("{} operation for {}", method.to_uppercase(), path)),
    );
    set_default(operation, "operationId", Value::from(operation_id(method, path)));
    set_default(
        operation,
        "tags",
        Value::Sequence(vec![Value::from(default_tag(path))]),
    );
    set_default(operation, "security", OPERATION_SECURITY.clone());
}

fn operation_id(method: &str, path: &str) -> String {
    let flattened: String = path
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .map(|c| if c == '/' { '_' } else { c })
        .collect();
    format!("{}{}", method, flattened)
}

fn default_tag(path: &str) -> String {
    path.split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("default")
        .to_string()
}
