use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::error::{ProbeError, Result};
use crate::source::{resolve, resolve_batch, MetricSource, ObjectName};
use crate::types::{Config, MetricDescriptor, MetricValue};

/// Runs one check's worth of queries over a single connection.
pub struct MetricsCollector<'a, S: MetricSource> {
    source: &'a S,
    config: &'a Config,
}

/// What a run brought back from the source.
#[derive(Debug)]
pub enum Collected {
    /// One value per descriptor, in descriptor order.
    Values(Vec<MetricValue>),
    /// A metric was missing and the policy tolerates it.
    Missing(ProbeError),
    /// Listing mode: the object's attribute names.
    AttributeNames(BTreeSet<String>),
}

#[derive(Debug)]
pub struct Collection {
    pub object: ObjectName,
    pub collected: Collected,
}

impl<'a, S: MetricSource> MetricsCollector<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self { source, config }
    }

    /// Open a connection, run every query and release the connection.
    ///
    /// The connection is closed on every path. A query failure takes
    /// precedence over a failure to close.
    pub async fn collect(&self, descriptors: &[MetricDescriptor]) -> Result<Collection> {
        let conn = self.source.open().await?;
        let outcome = self.collect_with(&conn, descriptors).await;
        let closed = self.source.close(conn).await;

        match (outcome, closed) {
            (Ok(collection), Ok(())) => Ok(collection),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("failed to close connection: {}", close_err);
                Err(e)
            }
        }
    }

    async fn collect_with(&self, conn: &S::Connection, descriptors: &[MetricDescriptor]) -> Result<Collection> {
        let object = self
            .source
            .resolve_object_identity(conn, &self.config.object_name)
            .await?;
        info!("resolved object {}", object);

        if self.config.list_attributes {
            let names = self.source.list_attribute_names(conn, &object).await?;
            debug!("{} attributes on {}", names.len(), object);
            return Ok(Collection {
                object,
                collected: Collected::AttributeNames(names),
            });
        }

        let fetched = match descriptors {
            [single] => resolve(self.source, conn, &object, single).await.map(|v| vec![v]),
            many => resolve_batch(self.source, conn, &object, many).await,
        };
        let collected = match fetched {
            Ok(values) => Collected::Values(values),
            Err(e) if self.config.ignore_missing && e.is_missing_metric() => {
                warn!("ignoring missing metric: {}", e);
                Collected::Missing(e)
            }
            Err(e) => return Err(e),
        };

        if let Some(operation) = &self.config.operation {
            info!("invoking {} on {}", operation, object);
            self.source.invoke_operation(conn, &object, operation).await?;
        }

        Ok(Collection { object, collected })
    }
}
