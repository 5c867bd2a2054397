//! Process-wide connection registry: one entry per origin, deduplicating
//! connections so distinct namespaces on the same origin share a transport.
//!
//! `register(origin, socket)` resolves or creates a [`Connection`]
//! for `origin`, trying each existing connection for that origin before
//! spawning a new one. Whether to remove the origin entry when the last
//! namespace unregisters from *a* connection, or only when the last
//! connection for the origin drops, is resolved here as: remove the
//! whole origin entry once its connection list becomes empty — see
//! [`ConnectionRegistry::remove`].

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use url::Url;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::json::JsonCodec;
use crate::socket::NamespaceSocket;

static GLOBAL: OnceLock<ConnectionRegistry> = OnceLock::new();

/// Origin URL -> the live connections registered against it.
///
/// A dependency-injected instance can be constructed directly (for tests,
/// or a host application wanting isolated registries); [`ConnectionRegistry::global`]
/// is the process-wide default everything else uses implicitly.
#[derive(Default)]
pub struct ConnectionRegistry {
    by_origin: DashMap<String, Vec<Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            by_origin: DashMap::new(),
        }
    }

    /// The process-wide default registry.
    pub fn global() -> &'static ConnectionRegistry {
        GLOBAL.get_or_init(ConnectionRegistry::new)
    }

    /// Resolve or create a connection for `socket`'s origin, register the
    /// socket on it, and return it.
    ///
    /// Tries each existing connection for the origin in order; the first
    /// one whose namespace table doesn't already hold this namespace wins.
    /// If none can take it (every connection already has this namespace
    /// registered, or none exist yet), a new connection is spawned and
    /// appended.
    pub async fn register(
        &self,
        origin: Url,
        namespace: impl Into<String>,
        config: ClientConfig,
        codec: Arc<dyn JsonCodec>,
        callbacks: Arc<dyn crate::socket::SocketCallbacks>,
    ) -> Arc<Connection> {
        let namespace = namespace.into();
        let origin_str = origin.to_string();

        let existing: Vec<Arc<Connection>> = self
            .by_origin
            .get(&origin_str)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        for connection in &existing {
            let socket = Arc::new(NamespaceSocket::new(
                namespace.clone(),
                Arc::clone(&callbacks),
                Arc::clone(&connection.headers),
            ));
            if connection.try_register(Arc::clone(&socket)).await {
                return Arc::clone(connection);
            }
        }

        let connection = Connection::spawn(origin, config, codec);
        let socket = Arc::new(NamespaceSocket::new(
            namespace,
            callbacks,
            Arc::clone(&connection.headers),
        ));
        connection.force_register(socket).await;

        self.by_origin
            .entry(origin_str)
            .or_default()
            .push(Arc::clone(&connection));

        connection
    }

    /// Remove `connection` from its origin's list; if the list becomes
    /// empty, remove the origin entry entirely.
    pub(crate) fn remove(&self, origin: &str, connection: &Connection) {
        let now_empty = match self.by_origin.get_mut(origin) {
            Some(mut entry) => {
                entry
                    .value_mut()
                    .retain(|c| !std::ptr::eq(c.as_ref(), connection));
                entry.value().is_empty()
            }
            None => return,
        };
        if now_empty {
            self.by_origin.remove(origin);
        }
    }

    #[cfg(test)]
    pub(crate) fn connection_count(&self, origin: &str) -> usize {
        self.by_origin
            .get(origin)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::SerdeJsonCodec;
    use crate::socket::SocketCallbacks;
    use async_trait::async_trait;

    struct NoOp;

    #[async_trait]
    impl SocketCallbacks for NoOp {}

    #[tokio::test]
    async fn distinct_namespaces_share_one_connection() {
        let registry = ConnectionRegistry::new();
        let origin = Url::parse("http://example.invalid:9").unwrap();
        let codec: Arc<dyn JsonCodec> = Arc::new(SerdeJsonCodec);

        let a = registry
            .register(
                origin.clone(),
                "",
                ClientConfig::default(),
                Arc::clone(&codec),
                Arc::new(NoOp),
            )
            .await;
        let b = registry
            .register(
                origin.clone(),
                "/chat",
                ClientConfig::default(),
                Arc::clone(&codec),
                Arc::new(NoOp),
            )
            .await;

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.connection_count(&origin.to_string()), 1);
    }

    #[tokio::test]
    async fn same_namespace_twice_gets_distinct_connections() {
        let registry = ConnectionRegistry::new();
        let origin = Url::parse("http://example.invalid:9").unwrap();
        let codec: Arc<dyn JsonCodec> = Arc::new(SerdeJsonCodec);

        let a = registry
            .register(
                origin.clone(),
                "/chat",
                ClientConfig::default(),
                Arc::clone(&codec),
                Arc::new(NoOp),
            )
            .await;
        let b = registry
            .register(
                origin.clone(),
                "/chat",
                ClientConfig::default(),
                Arc::clone(&codec),
                Arc::new(NoOp),
            )
            .await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.connection_count(&origin.to_string()), 2);
    }
}
