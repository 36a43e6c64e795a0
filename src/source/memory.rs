use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::error::{ProbeError, Result};
use crate::source::{check_object_name, MetricSource, ObjectName, RawValue};

/// In-memory metric source.
///
/// Counts fetch round-trips and open connections so callers can check that a
/// run released its connection and how many reads it issued.
#[derive(Debug, Default)]
pub struct StaticSource {
    objects: BTreeMap<ObjectName, BTreeMap<String, RawValue>>,
    operations: BTreeMap<ObjectName, BTreeSet<String>>,
    refuse_connections: bool,
    fetches: Cell<usize>,
    open_connections: Cell<usize>,
    invoked: RefCell<Vec<String>>,
}

/// Handle returned by [`StaticSource::open`].
#[derive(Debug)]
pub struct StaticConnection {
    _private: (),
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute<V: Into<RawValue>>(mut self, object: &str, name: &str, value: V) -> Self {
        self.objects
            .entry(ObjectName::new(object))
            .or_default()
            .insert(name.to_string(), value.into());
        self
    }

    pub fn with_operation(mut self, object: &str, operation: &str) -> Self {
        self.objects.entry(ObjectName::new(object)).or_default();
        self.operations
            .entry(ObjectName::new(object))
            .or_default()
            .insert(operation.to_string());
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Number of attribute read round-trips served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    pub fn open_connections(&self) -> usize {
        self.open_connections.get()
    }

    pub fn invoked_operations(&self) -> Vec<String> {
        self.invoked.borrow().clone()
    }

    fn attributes(&self, object: &ObjectName) -> Result<&BTreeMap<String, RawValue>> {
        self.objects
            .get(object)
            .ok_or_else(|| ProbeError::InstanceNotFound(object.to_string()))
    }

    fn attribute(&self, object: &ObjectName, name: &str) -> Result<RawValue> {
        self.attributes(object)?
            .get(name)
            .cloned()
            .ok_or_else(|| ProbeError::AttributeNotFound(name.to_string()))
    }
}

// `*` and `?` as shell-style wildcards over the whole name
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|_| ProbeError::MalformedPattern(pattern.to_string()))
}

impl MetricSource for StaticSource {
    type Connection = StaticConnection;

    async fn open(&self) -> Result<StaticConnection> {
        if self.refuse_connections {
            return Err(ProbeError::connection("connection refused"));
        }
        self.open_connections.set(self.open_connections.get() + 1);
        Ok(StaticConnection { _private: () })
    }

    async fn close(&self, _connection: StaticConnection) -> Result<()> {
        self.open_connections.set(self.open_connections.get().saturating_sub(1));
        Ok(())
    }

    async fn resolve_object_identity(&self, _connection: &StaticConnection, pattern: &str) -> Result<ObjectName> {
        if !check_object_name(pattern)? {
            let name = ObjectName::new(pattern);
            self.attributes(&name)?;
            return Ok(name);
        }

        let re = wildcard_regex(pattern)?;
        let matches: Vec<&ObjectName> = self.objects.keys().filter(|n| re.is_match(n.as_str())).collect();
        match matches.as_slice() {
            [] => Err(ProbeError::InstanceNotFound(pattern.to_string())),
            [only] => Ok((*only).clone()),
            many => Err(ProbeError::AmbiguousPattern {
                pattern: pattern.to_string(),
                matches: many.len(),
            }),
        }
    }

    async fn get_attribute(&self, _connection: &StaticConnection, object: &ObjectName, name: &str) -> Result<RawValue> {
        self.fetches.set(self.fetches.get() + 1);
        self.attribute(object, name)
    }

    async fn get_attributes(
        &self,
        _connection: &StaticConnection,
        object: &ObjectName,
        names: &[String],
    ) -> Result<Vec<RawValue>> {
        self.fetches.set(self.fetches.get() + 1);
        names.iter().map(|name| self.attribute(object, name)).collect()
    }

    async fn list_attribute_names(&self, _connection: &StaticConnection, object: &ObjectName) -> Result<BTreeSet<String>> {
        Ok(self.attributes(object)?.keys().cloned().collect())
    }

    async fn invoke_operation(&self, _connection: &StaticConnection, object: &ObjectName, operation: &str) -> Result<()> {
        let known = self
            .operations
            .get(object)
            .map_or(false, |ops| ops.contains(operation));
        if !known {
            return Err(ProbeError::Operation {
                operation: operation.to_string(),
                reason: format!("no such operation on {}", object),
            });
        }
        self.invoked.borrow_mut().push(operation.to_string());
        Ok(())
    }
}
