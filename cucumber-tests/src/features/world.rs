use cucumber::World as CucumberWorld;
use dmvc_core::app::DmvcServer;
use dmvc_core::auth::BearerTokenResolver;
use dmvc_core::config::DmvcConfig;
use dmvc_core::controller::{ControllerOptions, RoleOptions};
use dmvc_core::http::HttpServer;
use dmvc_core::model::ModelDefinition;
use dmvc_core::schema::{EntitySchema, FieldSpec, KeySchema};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Todo model served by the test server: composite key `todo` + `type`
pub struct TodoModel;

impl ModelDefinition for TodoModel {
    const NAME: &'static str = "Todo";

    fn schema() -> EntitySchema {
        EntitySchema::new(vec![
            FieldSpec::string("todo"),
            FieldSpec::string("title"),
            FieldSpec::boolean("completed").default_value(false),
            FieldSpec::integer("priority").optional(),
            FieldSpec::literal("type", "todo").default_value("todo"),
            FieldSpec::string("createdBy").optional(),
        ])
    }

    fn key_schema() -> KeySchema {
        KeySchema::new(vec![
            FieldSpec::string("todo"),
            FieldSpec::literal("type", "todo").default_value("todo"),
        ])
    }
}

/// Bearer tokens accepted by the test server, mapped to `(id, role)`
pub const TOKENS: [(&str, &str, &str); 2] = [("admin-token", "admin", "admin"), ("user-token", "alice", "user")];

#[derive(Debug, CucumberWorld)]
#[world(init = Self::new)]
pub struct DmvcWorld {
    pub base_url: Option<String>,
    pub client: reqwest::Client,
    pub token: Option<String>,
    pub last_status: Option<u16>,
    pub last_body: Value,
    server_handle: Option<JoinHandle<()>>,
}

impl DmvcWorld {
    fn new() -> Self {
        Self {
            base_url: None,
            client: reqwest::Client::new(),
            token: None,
            last_status: None,
            last_body: Value::Null,
            server_handle: None,
        }
    }

    /// Start a real HTTP server for the todo model on a random port
    ///
    /// Deleting requires the `admin` role; every other route accepts any
    /// authenticated actor.
    pub async fn start_server(&mut self, skip_auth: bool) -> Result<(), String> {
        let mut config = DmvcConfig::default();
        config.auth.skip_auth = skip_auth;
        for (token, id, role) in TOKENS {
            let attrs = match json!({ "id": id, "role": role }) {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            config.auth.tokens.insert(token.to_string(), attrs);
        }

        let roles = RoleOptions { delete: vec!["admin".to_string()], ..RoleOptions::default() };
        let resolver = Arc::new(BearerTokenResolver::from_config(&config.auth));

        let mut app = DmvcServer::with_config(config)
            .with_controller::<TodoModel>(ControllerOptions::new("/todos").with_roles(roles));
        let router = app.router().await.map_err(|e| format!("Router setup failed: {:#}", e))?;

        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|e| format!("Bind failed: {}", e))?;
        let addr = listener.local_addr().map_err(|e| e.to_string())?;

        let server = HttpServer::new(Arc::new(router)).with_resolver(resolver);
        self.server_handle = Some(tokio::spawn(async move {
            if let Err(e) = server.serve_listener(listener).await {
                eprintln!("❌ Test server stopped: {}", e);
            }
        }));
        self.base_url = Some(format!("http://{}", addr));
        Ok(())
    }

    /// Send a request and keep its status and JSON body
    pub async fn request(&mut self, method: &str, path: &str, body: Option<Value>) -> Result<(), String> {
        let base_url = self.base_url.clone().ok_or("Server not started")?;
        let method = reqwest::Method::from_bytes(method.as_bytes()).map_err(|e| e.to_string())?;

        let mut request = self.client.request(method, format!("{}{}", base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| format!("Request failed: {}", e))?;
        self.last_status = Some(response.status().as_u16());
        let text = response.text().await.map_err(|e| e.to_string())?;
        self.last_body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(())
    }

    /// Send a request that must succeed with `expected` status
    pub async fn request_expecting(&mut self, method: &str, path: &str, body: Option<Value>, expected: u16) {
        self.request(method, path, body).await.expect("request failed");
        assert_eq!(
            self.last_status,
            Some(expected),
            "{} {} returned {:?}: {}",
            method,
            path,
            self.last_status,
            self.last_body
        );
    }

    /// Items of the last list response
    pub fn items(&self) -> Vec<Value> {
        self.last_body.get("data").and_then(Value::as_array).cloned().unwrap_or_default()
    }
}

impl Drop for DmvcWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

/// Interpret a Gherkin cell or expectation: JSON when it parses, a string otherwise
pub fn cell_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
