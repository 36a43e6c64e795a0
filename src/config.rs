use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use crate::types::{Config, Unit};

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let service_url = required(env, "JMX_SERVICE_URL")?;
    let object_name = required(env, "JMX_OBJECT_NAME")?;

    let username = env.get_var("JMX_USERNAME").filter(|s| !s.is_empty());
    let password = env.get_var("JMX_PASSWORD").filter(|s| !s.is_empty());
    if username.is_some() != password.is_some() {
        return Err(anyhow!("JMX_USERNAME and JMX_PASSWORD must be set together"));
    }

    let list_attributes = flag(env, "JMX_LIST_ATTRIBUTES");
    let attributes = list(env, "JMX_ATTRIBUTES");
    if attributes.is_empty() && !list_attributes {
        return Err(anyhow!("JMX_ATTRIBUTES env var must be set (comma-separated)"));
    }

    let unit = env
        .get_var("JMX_UNITS")
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Unit>())
        .transpose()
        .context("Invalid JMX_UNITS")?;

    Ok(Config {
        service_url,
        username,
        password,
        object_name,
        attributes,
        attribute_keys: list(env, "JMX_ATTRIBUTE_KEYS"),
        warning: thresholds(env, "JMX_WARNING"),
        critical: thresholds(env, "JMX_CRITICAL"),
        unit,
        operation: env.get_var("JMX_OPERATION").filter(|s| !s.is_empty()),
        performance_data: flag(env, "JMX_PERFORMANCE_DATA"),
        ignore_missing: flag(env, "JMX_IGNORE_MISSING"),
        list_attributes,
        verbose: flag(env, "JMX_VERBOSE"),
    })
}

fn required<E: EnvironmentProvider>(env: &E, key: &str) -> Result<String> {
    env.get_var(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("{} env var must be set", key))
}

fn flag<E: EnvironmentProvider>(env: &E, key: &str) -> bool {
    env.get_var(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}

fn list<E: EnvironmentProvider>(env: &E, key: &str) -> Vec<String> {
    env.get_var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// one slot per metric; an empty slot leaves that metric without a threshold
fn thresholds<E: EnvironmentProvider>(env: &E, key: &str) -> Option<Vec<Option<String>>> {
    let raw = env.get_var(key).filter(|s| !s.is_empty())?;
    Some(
        raw.split(',')
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect(),
    )
}
