use super::{ConnectKwargs, ConnectParams, Connector, Credentials, Error, Transport};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scopeguard::ScopeGuard;
use tokio::sync::OnceCell;

/// Key deciding whether two opens share a transport.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionIdentity {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl From<Credentials> for ConnectionIdentity {
    fn from(credentials: Credentials) -> Self {
        let Credentials {
            host,
            port,
            username,
            password,
        } = credentials;

        Self {
            host,
            port,
            username,
            password,
        }
    }
}

impl From<ConnectionIdentity> for Credentials {
    fn from(identity: ConnectionIdentity) -> Self {
        let ConnectionIdentity {
            host,
            port,
            username,
            password,
        } = identity;

        Self {
            host,
            port,
            username,
            password,
        }
    }
}

impl From<&ConnectParams> for ConnectionIdentity {
    fn from(params: &ConnectParams) -> Self {
        Self {
            host: params.host.clone(),
            port: params.port,
            username: params.username.clone(),
            password: params.password.clone(),
        }
    }
}

impl fmt::Debug for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionIdentity")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A slot is inserted before connecting so that concurrent opens of the
/// same identity wait on one connect instead of racing.
type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// Live transports keyed by [`ConnectionIdentity`].
///
/// The cache is owned by the application: create one at startup, share it
/// (e.g. in an [`Arc`]) with everything that opens files and call
/// [`TransportCache::clear`] to force reconnection or on teardown.
///
/// Transports are never closed by the cache, they are dropped once the cache
/// and every stream opened over them are gone.
pub struct TransportCache<T> {
    slots: Mutex<HashMap<ConnectionIdentity, Slot<T>>>,
}

impl<T> Default for TransportCache<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> fmt::Debug for TransportCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportCache")
            .field("len", &self.len())
            .finish()
    }
}

impl<T> TransportCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionIdentity, Slot<T>>> {
        // The map is only mutated by single statements, so it is consistent
        // even if a holder panicked.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, identity: &ConnectionIdentity) -> Slot<T> {
        Arc::clone(self.lock().entry(identity.clone()).or_default())
    }

    /// Remove `slot` if its connect failed and nobody else is waiting on it.
    fn evict_empty(&self, identity: &ConnectionIdentity, slot: &Slot<T>) {
        let mut slots = self.lock();

        let is_unused = slots.get(identity).map_or(false, |cached| {
            // One reference held by the map, one by the caller.
            Arc::ptr_eq(cached, slot) && !cached.initialized() && Arc::strong_count(cached) == 2
        });

        if is_unused {
            slots.remove(identity);
        }
    }

    /// Return the transport of `identity` if one is established.
    pub fn get(&self, identity: &ConnectionIdentity) -> Option<Arc<T>> {
        self.lock().get(identity).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, identity: &ConnectionIdentity) -> bool {
        self.get(identity).is_some()
    }

    /// Number of established transports.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget the transport of `identity` so that the next open reconnects.
    ///
    /// The transport is returned, not closed.
    pub fn remove(&self, identity: &ConnectionIdentity) -> Option<Arc<T>> {
        let slot = self.lock().remove(identity)?;
        slot.get().cloned()
    }

    /// Forget every cached transport without closing them.
    pub fn clear(&self) {
        let mut slots = self.lock();

        #[cfg(feature = "tracing")]
        tracing::debug!(transports = slots.len(), "clearing transport cache");

        slots.clear();
    }
}

impl<T: Transport> TransportCache<T> {
    /// Return the transport cached for `identity` merged with `connect_kwargs`,
    /// connecting through `connector` on a miss.
    ///
    /// Fields set in `connect_kwargs` override the ones of `identity` and the
    /// merged identity is the cache key. A hit is returned as is, its liveness
    /// is not checked.
    ///
    /// Concurrent calls for the same identity connect at most once. Calls for
    /// different identities do not wait on each other.
    ///
    /// # Errors
    ///
    /// Errors from [`Connector::connect`] are returned unchanged and leave
    /// nothing behind in the cache.
    ///
    /// # Cancel Safety
    ///
    /// This function is cancel safe: dropping the future while connecting
    /// leaves nothing behind in the cache.
    pub async fn get_or_create<C>(
        &self,
        connector: &C,
        identity: ConnectionIdentity,
        connect_kwargs: &ConnectKwargs,
    ) -> Result<Arc<T>, Error>
    where
        C: Connector<Transport = T> + ?Sized,
    {
        let params = ConnectParams::new(identity.into(), connect_kwargs);
        let identity = ConnectionIdentity::from(&params);

        let slot = self.slot(&identity);

        if let Some(transport) = slot.get() {
            #[cfg(feature = "tracing")]
            tracing::debug!(host = %identity.host, port = identity.port, "reusing cached transport");

            return Ok(Arc::clone(transport));
        }

        let guard = scopeguard::guard((), |()| self.evict_empty(&identity, &slot));

        let transport = slot
            .get_or_try_init(|| async {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    host = %params.host,
                    port = params.port,
                    username = ?params.username,
                    "connecting new transport"
                );

                let res = connector.connect(&params).await;

                #[cfg(feature = "tracing")]
                if let Err(err) = &res {
                    tracing::warn!(%err, "failed to connect transport");
                }

                res.map(Arc::new)
            })
            .await?;

        ScopeGuard::into_inner(guard);

        Ok(Arc::clone(transport))
    }
}
