//! Multi-network connection pool with random and round-robin selection.
//!
//! A [`NetworkPool`] maps network names (`"ethereum"`, `"polygon"`, ...) to
//! the ordered list of [`NetworkConnection`]s serving that network. It is
//! populated once through a [`NetworkPoolBuilder`] and is read-only afterwards
//! apart from the per-network round-robin cursors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

use crate::connection::NetworkConnection;

/// Upper bound of the round-robin cursor; advancing past it wraps to zero.
const CURSOR_LIMIT: u32 = i32::MAX as u32;

struct NetworkSlot {
    connections: Vec<NetworkConnection>,
    cursor: AtomicU32,
}

impl NetworkSlot {
    /// Advance the cursor with a CAS retry loop and return the new value.
    fn advance(&self) -> u32 {
        let mut current = self.cursor.load(Ordering::Acquire);
        loop {
            let next = if current >= CURSOR_LIMIT { 0 } else { current + 1 };
            match self
                .cursor
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Registry of networks and their connections.
///
/// Selection on a network that was never registered (or registered with an
/// empty list) returns `None`; startup validation is expected to make that
/// unreachable for configured networks.
#[derive(Default)]
pub struct NetworkPool {
    networks: HashMap<String, NetworkSlot>,
}

impl NetworkPool {
    /// Start building an empty pool.
    pub fn builder() -> NetworkPoolBuilder {
        NetworkPoolBuilder::default()
    }

    /// All connections registered for `network`, in registration order.
    /// Unknown networks yield an empty slice.
    pub fn connections_for(&self, network: &str) -> &[NetworkConnection] {
        self.networks
            .get(network)
            .map(|slot| slot.connections.as_slice())
            .unwrap_or(&[])
    }

    /// A uniformly random connection for `network`.
    pub fn random_connection_for(&self, network: &str) -> Option<&NetworkConnection> {
        let connections = &self.networks.get(network)?.connections;
        match connections.len() {
            0 => None,
            1 => connections.first(),
            len => connections.get(rand::rng().random_range(0..len)),
        }
    }

    /// The next connection for `network` in round-robin order.
    pub fn next_connection_for(&self, network: &str) -> Option<&NetworkConnection> {
        let slot = self.networks.get(network)?;
        match slot.connections.len() {
            0 => None,
            1 => slot.connections.first(),
            len => {
                let next = slot.advance() as usize;
                slot.connections.get(next % len)
            }
        }
    }

    /// Returns `true` if `network` has been registered.
    pub fn contains(&self, network: &str) -> bool {
        self.networks.contains_key(network)
    }

    /// Registered network names, sorted.
    pub fn networks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.networks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered networks.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Returns `true` if no network has been registered.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Union `connections` onto any list already registered under `network`
    /// and reset its round-robin cursor.
    fn append(&mut self, connections: Vec<NetworkConnection>, network: String) {
        let added = connections.len();
        let slot = self.networks.entry(network.clone()).or_insert_with(|| NetworkSlot {
            connections: Vec::with_capacity(added),
            cursor: AtomicU32::new(0),
        });
        slot.connections.extend(connections);
        *slot.cursor.get_mut() = 0;
        tracing::debug!(
            network = %network,
            added,
            total = slot.connections.len(),
            "registered connections"
        );
    }
}

impl std::fmt::Debug for NetworkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for name in self.networks() {
            map.entry(&name, &self.connections_for(name));
        }
        map.finish()
    }
}

/// Staging object used once at startup to populate a [`NetworkPool`].
#[derive(Default)]
pub struct NetworkPoolBuilder {
    pool: NetworkPool,
}

impl NetworkPoolBuilder {
    /// Register `connections` under `network`. Registering the same name
    /// twice appends to the existing list.
    pub fn register(mut self, connections: Vec<NetworkConnection>, network: impl Into<String>) -> Self {
        self.pool.append(connections, network.into());
        self
    }

    /// Finish construction.
    pub fn finish(self) -> NetworkPool {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::request::{JsonRpcRequest, JsonRpcResponse};
    use crate::transport::{RpcTransport, TransportKind};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct MockTransport {
        url: String,
    }

    #[async_trait]
    impl RpcTransport for MockTransport {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            Ok(JsonRpcResponse::success(req.id, serde_json::json!("0x1")))
        }

        fn endpoint(&self) -> &str {
            &self.url
        }

        fn kind(&self) -> TransportKind {
            TransportKind::Http
        }
    }

    fn conn(url: &str) -> NetworkConnection {
        NetworkConnection::new(Arc::new(MockTransport { url: url.to_string() }), None)
    }

    fn conns(urls: &[&str]) -> Vec<NetworkConnection> {
        urls.iter().map(|u| conn(u)).collect()
    }

    fn endpoint(c: &NetworkConnection) -> &str {
        c.transport().endpoint()
    }

    #[test]
    fn unknown_network_is_empty() {
        let pool = NetworkPool::builder().register(conns(&["http://a"]), "ethereum").finish();
        assert!(pool.connections_for("polygon").is_empty());
        assert!(pool.random_connection_for("polygon").is_none());
        assert!(pool.next_connection_for("polygon").is_none());
        // names are case-sensitive
        assert!(pool.connections_for("Ethereum").is_empty());
    }

    #[test]
    fn round_robin_cycles_in_registration_order() {
        let pool = NetworkPool::builder()
            .register(conns(&["http://a", "http://b", "http://c"]), "test")
            .finish();
        let picked: Vec<&str> = (0..6)
            .map(|_| endpoint(pool.next_connection_for("test").unwrap()))
            .collect();
        // cursor starts at 0 and is advanced before selecting
        assert_eq!(
            picked,
            ["http://b", "http://c", "http://a", "http://b", "http://c", "http://a"]
        );
    }

    #[test]
    fn round_robin_visits_every_connection() {
        let urls: Vec<String> = (0..7).map(|i| format!("http://node-{i}")).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let pool = NetworkPool::builder().register(conns(&refs), "test").finish();

        let seen: HashSet<&str> = (0..7)
            .map(|_| endpoint(pool.next_connection_for("test").unwrap()))
            .collect();
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn cursor_wraps_at_limit_without_leaving_bounds() {
        let pool = NetworkPool::builder()
            .register(conns(&["http://a", "http://b", "http://c"]), "test")
            .finish();
        let slot = &pool.networks["test"];
        slot.cursor.store(CURSOR_LIMIT - 2, Ordering::SeqCst);

        for _ in 0..10 {
            assert!(pool.next_connection_for("test").is_some());
            assert!(slot.cursor.load(Ordering::SeqCst) <= CURSOR_LIMIT);
        }
        // LIMIT-1, LIMIT, then 0, 1, ... 7
        assert_eq!(slot.cursor.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn cursor_wraps_to_zero_and_selects_first() {
        let pool = NetworkPool::builder()
            .register(conns(&["http://a", "http://b"]), "test")
            .finish();
        let slot = &pool.networks["test"];
        slot.cursor.store(CURSOR_LIMIT, Ordering::SeqCst);

        assert_eq!(endpoint(pool.next_connection_for("test").unwrap()), "http://a");
        assert_eq!(slot.cursor.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_round_robin_loses_no_updates() {
        let pool = Arc::new(
            NetworkPool::builder()
                .register(conns(&["http://a", "http://b", "http://c"]), "test")
                .finish(),
        );
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        assert!(pool.next_connection_for("test").is_some());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pool.networks["test"].cursor.load(Ordering::SeqCst), 8_000);
    }

    #[test]
    fn single_connection_fast_path() {
        let pool = NetworkPool::builder().register(conns(&["http://solo"]), "solo").finish();
        for _ in 0..50 {
            assert_eq!(endpoint(pool.random_connection_for("solo").unwrap()), "http://solo");
            assert_eq!(endpoint(pool.next_connection_for("solo").unwrap()), "http://solo");
        }
        // the fast path never touches the cursor
        assert_eq!(pool.networks["solo"].cursor.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_registration_selects_nothing() {
        let pool = NetworkPool::builder().register(Vec::new(), "empty").finish();
        assert!(pool.contains("empty"));
        assert!(pool.connections_for("empty").is_empty());
        assert!(pool.random_connection_for("empty").is_none());
        assert!(pool.next_connection_for("empty").is_none());
    }

    #[test]
    fn random_selection_stays_in_range() {
        let pool = NetworkPool::builder()
            .register(conns(&["http://a", "http://b", "http://c"]), "test")
            .finish();
        let allowed: HashSet<&str> = ["http://a", "http://b", "http://c"].into_iter().collect();
        for _ in 0..200 {
            let c = pool.random_connection_for("test").unwrap();
            assert!(allowed.contains(endpoint(c)));
        }
        assert_eq!(pool.networks["test"].cursor.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn second_registration_appends_and_resets_cursor() {
        let builder = NetworkPool::builder().register(conns(&["http://a", "http://b"]), "eth");
        let pool = builder.register(conns(&["http://c"]), "eth").finish();

        let list: Vec<&str> = pool.connections_for("eth").iter().map(endpoint).collect();
        assert_eq!(list, ["http://a", "http://b", "http://c"]);
        assert_eq!(pool.networks["eth"].cursor.load(Ordering::SeqCst), 0);

        // selection uses the whole list, not just the last batch
        let picked: Vec<&str> = (0..3)
            .map(|_| endpoint(pool.next_connection_for("eth").unwrap()))
            .collect();
        assert_eq!(picked, ["http://b", "http://c", "http://a"]);
    }

    #[test]
    fn re_registration_resets_an_advanced_cursor() {
        let mut pool = NetworkPool::builder().register(conns(&["http://a", "http://b"]), "eth").finish();
        pool.next_connection_for("eth");
        pool.next_connection_for("eth");
        assert_eq!(pool.networks["eth"].cursor.load(Ordering::SeqCst), 2);

        pool.append(conns(&["http://c"]), "eth".into());
        assert_eq!(pool.networks["eth"].cursor.load(Ordering::SeqCst), 0);
        assert_eq!(pool.connections_for("eth").len(), 3);
    }

    #[test]
    fn networks_are_sorted() {
        let pool = NetworkPool::builder()
            .register(conns(&["http://p"]), "polygon")
            .register(conns(&["http://e"]), "ethereum")
            .finish();
        assert_eq!(pool.networks(), ["ethereum", "polygon"]);
        assert_eq!(pool.len(), 2);
        assert!(!pool.is_empty());
    }
}
