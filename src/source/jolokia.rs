use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use num_bigint::BigInt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::error::{ProbeError, Result};
use crate::parsing::NumericValue;
use crate::source::{check_object_name, MetricSource, ObjectName, RawValue};
use crate::types::Config;

/// Metric source speaking the Jolokia JSON protocol over HTTP.
#[derive(Debug, Clone)]
pub struct JolokiaSource {
    agent_url: String,
    credentials: Option<(String, String)>,
}

/// An HTTP client bound to one agent.
#[derive(Debug)]
pub struct JolokiaConnection {
    client: reqwest::Client,
    agent_url: String,
    credentials: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    status: u16,
    #[serde(default)]
    value: Value,
    error_type: Option<String>,
    error: Option<String>,
}

impl Reply {
    fn is_success(&self) -> bool {
        self.status == 200
    }

    fn message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| format!("agent returned status {}", self.status))
    }

    /// Map a failed reply onto the probe's error kinds; `subject` names what
    /// was being looked up.
    fn into_error(self, subject: &str) -> ProbeError {
        let kind = self.error_type.as_deref().unwrap_or_default();
        let short = kind.rsplit('.').next().unwrap_or(kind);
        match short {
            "InstanceNotFoundException" => ProbeError::InstanceNotFound(subject.to_string()),
            "AttributeNotFoundException" => ProbeError::AttributeNotFound(subject.to_string()),
            "MalformedObjectNameException" => ProbeError::MalformedPattern(subject.to_string()),
            _ => ProbeError::connection(format!("Error querying server: {}", self.message())),
        }
    }
}

impl JolokiaSource {
    pub fn new(agent_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn from_config(cfg: &Config) -> Self {
        let source = Self::new(cfg.service_url.clone());
        match (&cfg.username, &cfg.password) {
            (Some(user), Some(pass)) => source.with_credentials(user.clone(), pass.clone()),
            _ => source,
        }
    }
}

impl JolokiaConnection {
    async fn request(&self, body: Value) -> Result<Reply> {
        debug!("jolokia request: {}", body);
        let mut req = self.client.post(&self.agent_url).json(&body);
        if let Some((user, pass)) = &self.credentials {
            req = req.basic_auth(user, Some(pass));
        }

        let res = req
            .send()
            .await
            .map_err(|e| ProbeError::connection(format!("{}: {}", self.agent_url, e)))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            error!("jolokia agent failed: {} - {}", status, body);
            return Err(ProbeError::connection(format!("{} returned {}", self.agent_url, status)));
        }
        res.json::<Reply>()
            .await
            .map_err(|e| ProbeError::connection(format!("Error querying server: {}", e)))
    }
}

impl MetricSource for JolokiaSource {
    type Connection = JolokiaConnection;

    async fn open(&self) -> Result<JolokiaConnection> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProbeError::connection(e.to_string()))?;
        let conn = JolokiaConnection {
            client,
            agent_url: self.agent_url.clone(),
            credentials: self.credentials.clone(),
        };

        let reply = conn.request(json!({"type": "version"})).await?;
        if !reply.is_success() {
            return Err(ProbeError::connection(reply.message()));
        }
        debug!("connected to {}", self.agent_url);
        Ok(conn)
    }

    async fn close(&self, _connection: JolokiaConnection) -> Result<()> {
        // HTTP is stateless; dropping the client releases its pool
        Ok(())
    }

    async fn resolve_object_identity(&self, connection: &JolokiaConnection, pattern: &str) -> Result<ObjectName> {
        if !check_object_name(pattern)? {
            return Ok(ObjectName::new(pattern));
        }

        let reply = connection.request(json!({"type": "search", "mbean": pattern})).await?;
        if !reply.is_success() {
            return Err(reply.into_error(pattern));
        }
        let names: Vec<&str> = reply
            .value
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        match names.as_slice() {
            [] => Err(ProbeError::InstanceNotFound(pattern.to_string())),
            [only] => Ok(ObjectName::new(*only)),
            many => Err(ProbeError::AmbiguousPattern {
                pattern: pattern.to_string(),
                matches: many.len(),
            }),
        }
    }

    async fn get_attribute(&self, connection: &JolokiaConnection, object: &ObjectName, name: &str) -> Result<RawValue> {
        let reply = connection
            .request(json!({"type": "read", "mbean": object.as_str(), "attribute": name}))
            .await?;
        if !reply.is_success() {
            return Err(read_error(reply, object, name));
        }
        raw_from_json(&reply.value)
    }

    async fn get_attributes(
        &self,
        connection: &JolokiaConnection,
        object: &ObjectName,
        names: &[String],
    ) -> Result<Vec<RawValue>> {
        let reply = connection
            .request(json!({"type": "read", "mbean": object.as_str(), "attribute": names}))
            .await?;
        if !reply.is_success() {
            return Err(read_error(reply, object, &names.join(",")));
        }
        let Value::Object(values) = &reply.value else {
            return Err(ProbeError::connection("Error querying server: unexpected read reply"));
        };
        names
            .iter()
            .map(|name| {
                values
                    .get(name)
                    .ok_or_else(|| ProbeError::AttributeNotFound(name.clone()))
                    .and_then(raw_from_json)
            })
            .collect()
    }

    async fn list_attribute_names(&self, connection: &JolokiaConnection, object: &ObjectName) -> Result<BTreeSet<String>> {
        let path = list_path(object)?;
        let reply = connection.request(json!({"type": "list", "path": path})).await?;
        if !reply.is_success() {
            return Err(reply.into_error(object.as_str()));
        }
        match &reply.value {
            Value::Object(attrs) => Ok(attrs.keys().cloned().collect()),
            // the agent answers an empty list for objects without attributes
            _ => Ok(BTreeSet::new()),
        }
    }

    async fn invoke_operation(&self, connection: &JolokiaConnection, object: &ObjectName, operation: &str) -> Result<()> {
        let reply = connection
            .request(json!({
                "type": "exec",
                "mbean": object.as_str(),
                "operation": operation,
                "arguments": [],
            }))
            .await
            .map_err(|e| ProbeError::Operation {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;
        if !reply.is_success() {
            return Err(ProbeError::Operation {
                operation: operation.to_string(),
                reason: reply.message(),
            });
        }
        Ok(())
    }
}

fn read_error(reply: Reply, object: &ObjectName, attribute: &str) -> ProbeError {
    let is_instance = reply
        .error_type
        .as_deref()
        .map_or(false, |t| t.ends_with("InstanceNotFoundException"));
    if is_instance {
        reply.into_error(object.as_str())
    } else {
        reply.into_error(attribute)
    }
}

/// `domain/props/attr` with `!` and `/` escaped the way the agent expects.
fn list_path(object: &ObjectName) -> Result<String> {
    let (domain, props) = object
        .as_str()
        .split_once(':')
        .ok_or_else(|| ProbeError::MalformedPattern(object.to_string()))?;
    let escape = |s: &str| s.replace('!', "!!").replace('/', "!/");
    Ok(format!("{}/{}/attr", escape(domain), escape(props)))
}

/// Convert an agent value into a raw attribute value.
///
/// Arrays are only representable inside a composite, where they are kept as
/// their JSON text.
pub fn raw_from_json(value: &Value) -> Result<RawValue> {
    match value {
        Value::Array(_) => Err(ProbeError::UnsupportedValueType(value.to_string())),
        other => Ok(convert(other)),
    }
}

fn convert(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Null,
        Value::Bool(b) => RawValue::Text(b.to_string()),
        Value::String(s) => RawValue::Text(s.clone()),
        Value::Number(n) => numeric_from_json(n),
        Value::Array(_) => RawValue::Text(value.to_string()),
        Value::Object(fields) => RawValue::Composite(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), convert(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

fn numeric_from_json(n: &serde_json::Number) -> RawValue {
    let text = n.to_string();
    if text.contains(['.', 'e', 'E']) {
        return n.as_f64().map_or(RawValue::Text(text), RawValue::from);
    }
    if let Some(v) = n.as_i64() {
        return RawValue::from(v);
    }
    match BigInt::from_str(&text) {
        Ok(big) => RawValue::Numeric(NumericValue::BigInteger(big)),
        Err(_) => RawValue::Text(text),
    }
}
