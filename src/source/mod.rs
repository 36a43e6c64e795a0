// Metric source boundary and composite navigation
pub mod jolokia;
pub mod memory;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::parsing::NumericValue;
use crate::types::{MetricDescriptor, MetricValue};

pub use jolokia::{JolokiaConnection, JolokiaSource};
pub use memory::{StaticConnection, StaticSource};

/// Concrete name of one managed object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectName(String);

impl ObjectName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check `domain:key=value[,key=value|*]` syntax.
///
/// Returns `true` when the name is a pattern (wildcards in the domain or an
/// unquoted value, or a trailing `*` property) and has to be resolved by a
/// query. Quoted values are opaque: commas, `=` and wildcards inside them
/// are literal.
pub fn check_object_name(name: &str) -> Result<bool> {
    let malformed = || ProbeError::MalformedPattern(name.to_string());

    let (domain, props) = name.split_once(':').ok_or_else(malformed)?;
    if props.is_empty() {
        return Err(malformed());
    }

    let mut is_pattern = domain.contains(['*', '?']);
    for prop in split_properties(props).ok_or_else(malformed)? {
        if prop == "*" {
            is_pattern = true;
            continue;
        }
        let (key, value) = prop.split_once('=').ok_or_else(malformed)?;
        if key.is_empty() || value.is_empty() || key.contains(['*', '?', '"']) {
            return Err(malformed());
        }
        if value.starts_with('"') {
            if !is_quoted(value) {
                return Err(malformed());
            }
        } else if value.contains(['"', '=']) {
            return Err(malformed());
        } else if value.contains(['*', '?']) {
            is_pattern = true;
        }
    }
    Ok(is_pattern)
}

/// Split a property list on commas outside quoted values. `None` when a
/// quote is left open.
fn split_properties(props: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in props.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            ',' if !in_quote => {
                parts.push(&props[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quote {
        return None;
    }
    parts.push(&props[start..]);
    Some(parts)
}

/// `"..."` with every inner quote and backslash escaped.
fn is_quoted(value: &str) -> bool {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return false;
    };
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '"' => return false,
            _ => {}
        }
    }
    true
}

/// Attribute value as delivered by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Numeric(NumericValue),
    Text(String),
    Composite(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn composite<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, RawValue)>,
    {
        RawValue::Composite(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Narrow to `sub_key` when given.
    ///
    /// A composite read without a key is kept whole as text.
    pub fn navigate(&self, sub_key: Option<&str>) -> Result<MetricValue> {
        match (self, sub_key) {
            (value, None) => Ok(value.to_metric()),
            (RawValue::Composite(fields), Some(key)) => fields
                .get(key)
                .map(RawValue::to_metric)
                .ok_or_else(|| ProbeError::CompositeKeyNotFound(key.to_string())),
            (_, Some(key)) => Err(ProbeError::CompositeKeyNotFound(key.to_string())),
        }
    }

    fn to_metric(&self) -> MetricValue {
        match self {
            RawValue::Null => MetricValue::Null,
            RawValue::Numeric(n) => MetricValue::Numeric(n.clone()),
            RawValue::Text(s) => MetricValue::Text(s.clone()),
            RawValue::Composite(_) => MetricValue::Text(self.to_string()),
        }
    }
}

impl From<NumericValue> for RawValue {
    fn from(value: NumericValue) -> Self {
        RawValue::Numeric(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Numeric(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Numeric(value.into())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("null"),
            RawValue::Numeric(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Composite(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A remote attribute store.
///
/// One connection is opened per run, passed by reference to every query and
/// handed back to [`MetricSource::close`] when the run is over.
#[allow(async_fn_in_trait)]
pub trait MetricSource {
    type Connection;

    async fn open(&self) -> Result<Self::Connection>;

    async fn close(&self, connection: Self::Connection) -> Result<()>;

    /// Resolve a name or pattern to exactly one object.
    async fn resolve_object_identity(&self, connection: &Self::Connection, pattern: &str) -> Result<ObjectName>;

    async fn get_attribute(&self, connection: &Self::Connection, object: &ObjectName, name: &str) -> Result<RawValue>;

    /// Fetch several attributes in one round-trip, in request order.
    async fn get_attributes(
        &self,
        connection: &Self::Connection,
        object: &ObjectName,
        names: &[String],
    ) -> Result<Vec<RawValue>>;

    async fn list_attribute_names(&self, connection: &Self::Connection, object: &ObjectName) -> Result<BTreeSet<String>>;

    async fn invoke_operation(&self, connection: &Self::Connection, object: &ObjectName, operation: &str) -> Result<()>;
}

/// Fetch one metric.
pub async fn resolve<S: MetricSource>(
    source: &S,
    connection: &S::Connection,
    object: &ObjectName,
    descriptor: &MetricDescriptor,
) -> Result<MetricValue> {
    let raw = source.get_attribute(connection, object, &descriptor.name).await?;
    raw.navigate(descriptor.sub_key.as_deref())
}

/// Fetch a batch of metrics in descriptor order.
///
/// When every descriptor addresses a different key of the same attribute,
/// the attribute is read once and fanned out.
pub async fn resolve_batch<S: MetricSource>(
    source: &S,
    connection: &S::Connection,
    object: &ObjectName,
    descriptors: &[MetricDescriptor],
) -> Result<Vec<MetricValue>> {
    if descriptors.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(name) = shared_composite(descriptors) {
        debug!("reading {} once for {} keys", name, descriptors.len());
        let raw = source.get_attribute(connection, object, name).await?;
        return descriptors
            .iter()
            .map(|d| raw.navigate(d.sub_key.as_deref()))
            .collect();
    }

    let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
    let raws = source.get_attributes(connection, object, &names).await?;
    if raws.len() != descriptors.len() {
        return Err(ProbeError::arity("attribute values", descriptors.len(), raws.len()));
    }
    descriptors
        .iter()
        .zip(&raws)
        .map(|(d, raw)| raw.navigate(d.sub_key.as_deref()))
        .collect()
}

fn shared_composite(descriptors: &[MetricDescriptor]) -> Option<&str> {
    let (first, rest) = descriptors.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let all_keyed_on_first = descriptors
        .iter()
        .all(|d| d.sub_key.is_some() && d.name == first.name);
    all_keyed_on_first.then_some(first.name.as_str())
}
