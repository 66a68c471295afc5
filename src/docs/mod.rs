//! API documentation
//!
//! Builds an OpenAPI 3.0 document for the built-in endpoints and every
//! operation registered by the mounted sub-APIs, and serves it together
//! with a Swagger UI page.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::security::API_KEY_HEADER;
use crate::config::DocsConfig;

/// Path of the Swagger UI page
pub const DOCS_PATH: &str = "/api/docs";
/// Path of the generated OpenAPI document
pub const OPENAPI_PATH: &str = "/api/docs/openapi.json";

const SECURITY_SCHEME: &str = "ApiKeyAuth";

/// Documentation for a single operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDoc {
    /// Lowercase HTTP method (`get`, `post`, ...)
    pub method: String,
    /// Full path; axum-style `:param` segments are accepted
    pub path: String,
    pub summary: String,
    #[serde(default)]
    pub tag: Option<String>,
    /// Whether the operation sits behind the access gate
    #[serde(default)]
    pub protected: bool,
}

impl OperationDoc {
    pub fn new(method: &str, path: &str, summary: &str) -> Self {
        Self {
            method: method.to_ascii_lowercase(),
            path: path.to_string(),
            summary: summary.to_string(),
            tag: None,
            protected: false,
        }
    }

    pub fn get(path: &str, summary: &str) -> Self {
        Self::new("get", path, summary)
    }

    pub fn post(path: &str, summary: &str) -> Self {
        Self::new("post", path, summary)
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    fn to_openapi(&self) -> Value {
        let mut responses = Map::new();
        responses.insert("200".to_string(), json!({ "description": "Success" }));

        if self.protected {
            responses.insert(
                "401".to_string(),
                error_response("Missing or invalid API key"),
            );
            responses.insert(
                "500".to_string(),
                error_response("Server misconfiguration: API key not set"),
            );
        }
        responses.insert("429".to_string(), error_response("Rate limit exceeded"));

        let mut operation = Map::new();
        operation.insert("summary".to_string(), json!(self.summary));
        if let Some(tag) = &self.tag {
            operation.insert("tags".to_string(), json!([tag]));
        }
        let parameters = path_parameters(&self.path);
        if !parameters.is_empty() {
            operation.insert("parameters".to_string(), Value::Array(parameters));
        }
        if self.protected {
            operation.insert("security".to_string(), json!([{ SECURITY_SCHEME: [] }]));
        }
        operation.insert("responses".to_string(), Value::Object(responses));

        Value::Object(operation)
    }
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

/// Convert `/loans/:id` into the OpenAPI form `/loans/{id}`
pub fn openapi_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn path_parameters(path: &str) -> Vec<Value> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })
        })
        .collect()
}

/// OpenAPI document builder
#[derive(Debug, Clone)]
pub struct ApiDoc {
    title: String,
    description: String,
    version: String,
    operations: Vec<OperationDoc>,
}

impl ApiDoc {
    /// Start a document containing the built-in endpoints
    pub fn new(config: &DocsConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            version: config.version.clone(),
            operations: vec![
                OperationDoc::get("/", "Liveness message").with_tag("System"),
                OperationDoc::get("/health", "Service health, uptime and timestamp")
                    .with_tag("System"),
            ],
        }
    }

    pub fn operation(mut self, operation: OperationDoc) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations<I>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = OperationDoc>,
    {
        self.operations.extend(operations);
        self
    }

    /// Render the OpenAPI document
    pub fn to_openapi(&self) -> Value {
        let mut paths = Map::new();
        for op in &self.operations {
            let entry = paths
                .entry(openapi_path(&op.path))
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(methods) = entry {
                methods.insert(op.method.clone(), op.to_openapi());
            }
        }

        json!({
            "openapi": "3.0.3",
            "info": {
                "title": self.title,
                "description": self.description,
                "version": self.version,
            },
            "paths": paths,
            "components": {
                "securitySchemes": {
                    SECURITY_SCHEME: {
                        "type": "apiKey",
                        "in": "header",
                        "name": API_KEY_HEADER,
                    }
                },
                "schemas": {
                    "ErrorResponse": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean", "example": false },
                            "message": { "type": "string" }
                        },
                        "required": ["success", "message"]
                    },
                    "HealthResponse": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string", "example": "ok" },
                            "uptime": { "type": "number", "description": "Seconds since start" },
                            "timestamp": { "type": "integer", "description": "Unix time in milliseconds" }
                        }
                    }
                }
            }
        })
    }
}

/// Swagger UI page pointing at the generated document
pub fn swagger_ui_html(title: &str, spec_url: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: "{spec_url}", dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>"##,
        title = title,
        spec_url = spec_url,
    )
}

#[derive(Clone)]
struct DocsState {
    document: Arc<Value>,
    page: Arc<String>,
}

async fn openapi_json(State(state): State<DocsState>) -> Json<Value> {
    Json(state.document.as_ref().clone())
}

async fn swagger_ui(State(state): State<DocsState>) -> impl IntoResponse {
    Html(state.page.as_ref().clone())
}

/// Routes serving the Swagger UI page and the OpenAPI document
pub fn docs_routes(doc: &ApiDoc) -> Router {
    let state = DocsState {
        document: Arc::new(doc.to_openapi()),
        page: Arc::new(swagger_ui_html(&doc.title, OPENAPI_PATH)),
    };

    Router::new()
        .route(DOCS_PATH, get(swagger_ui))
        .route(OPENAPI_PATH, get(openapi_json))
        .with_state(state)
}
