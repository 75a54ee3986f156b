use super::*;

/// An idle connection waiting in the cache.
struct IdleConnection {
    conn: Connection,
    last_used: Instant,
}

/// Cache value; the connection is taken out when leased.
#[derive(Clone)]
struct IdleSlot(Arc<std::sync::Mutex<Option<IdleConnection>>>);

impl IdleSlot {
    fn new(idle: IdleConnection) -> Self {
        Self(Arc::new(std::sync::Mutex::new(Some(idle))))
    }

    fn take(&self) -> Option<IdleConnection> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Default connection pool for one device.
///
/// Idle connections live in a moka cache that evicts them once the
/// configured TTL passes without use. At most `capacity` connections are
/// leased at once, and a reused connection is held back until the
/// inter-use delay since its last exchange has passed.
pub struct ConnectionManager<D> {
    dialer: D,
    idle: Cache<u64, IdleSlot>,
    permits: Semaphore,
    next_id: AtomicU64,
    ttl: Duration,
    delay: Duration,
    logging: bool,
}

impl<D: Dial> ConnectionManager<D> {
    /// Creates a pool that dials through `dialer`.
    pub fn new(dialer: D, ttl: Duration, delay: Duration, logging: bool) -> Self {
        Self::with_capacity(dialer, config::MAX_CONNECTIONS, ttl, delay, logging)
    }

    /// Creates a pool allowing `capacity` concurrent connections.
    pub fn with_capacity(
        dialer: D,
        capacity: usize,
        ttl: Duration,
        delay: Duration,
        logging: bool,
    ) -> Self {
        let capacity = capacity.max(1);
        let mut builder = Cache::<u64, IdleSlot>::builder()
            .max_capacity(capacity as u64)
            .time_to_live(ttl);
        if logging {
            let addr = dialer.addr().to_string();
            builder = builder.eviction_listener(move |_id, _slot, cause| {
                if cause.was_evicted() {
                    debug!("{} idle connection evicted: {:?}", addr, cause);
                }
            });
        }

        Self {
            dialer,
            idle: builder.build(),
            permits: Semaphore::new(capacity),
            next_id: AtomicU64::new(0),
            ttl,
            delay,
            logging,
        }
    }

    /// Address of the device this pool dials.
    pub fn addr(&self) -> &str {
        self.dialer.addr()
    }

    /// Number of idle connections currently cached.
    pub async fn idle_count(&self) -> u64 {
        self.idle.run_pending_tasks().await;
        self.idle.entry_count()
    }

    /// Drops every idle connection.
    pub async fn close_idle(&self) {
        self.idle.invalidate_all();
        self.idle.run_pending_tasks().await;
    }

    /// Takes a still-fresh idle connection out of the cache, if any.
    async fn checkout(&self) -> Option<IdleConnection> {
        let ids: Vec<u64> = self.idle.iter().map(|(id, _)| *id).collect();
        for id in ids {
            let Some(slot) = self.idle.remove(&id).await else {
                continue;
            };
            let Some(idle) = slot.take() else {
                continue;
            };
            if idle.last_used.elapsed() < self.ttl {
                if self.logging {
                    debug!("Cache hit: {}", self.addr());
                }
                return Some(idle);
            }
            if self.logging {
                debug!("Idle connection {} expired. Closing.", self.addr());
            }
        }
        None
    }

    async fn checkin(&self, conn: Connection) {
        self.restore(IdleConnection {
            conn,
            last_used: Instant::now(),
        })
        .await;
    }

    /// Returns an unused connection to the cache, keeping its last-use time.
    async fn restore(&self, idle: IdleConnection) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.idle.insert(id, IdleSlot::new(idle)).await;
    }

    /// Leases a Ready connection: a cached one after its delay, or a fresh one.
    async fn lease(&self, ctx: &Context) -> Result<Connection> {
        let Some(idle) = self.checkout().await else {
            if self.logging {
                debug!("Cache miss, creating new connection for {}...", self.addr());
            }
            return self.dialer.dial(ctx).await;
        };

        let ready_at = idle.last_used + self.delay;
        if ready_at > Instant::now() {
            let waited = ctx
                .guard(ctx.deadline_or(COMMAND_TIMEOUT), async {
                    tokio::time::sleep_until(ready_at).await;
                    Ok(())
                })
                .await;
            if let Err(source) = waited {
                // the connection never saw any I/O, keep it
                if self.logging {
                    debug!("Lease of {} abandoned: {}", self.addr(), source);
                }
                self.restore(idle).await;
                return Err(self.lease_error(source));
            }
        }
        Ok(idle.conn)
    }

    fn lease_error(&self, source: io::Error) -> SwitcherError {
        SwitcherError::LeaseError {
            addr: self.addr().to_string(),
            source,
        }
    }
}

impl<D: Dial> ConnectionPool for ConnectionManager<D> {
    fn run<'a, T, F>(&'a self, ctx: &'a Context, op: F) -> BoxFuture<'a, Result<T>>
    where
        T: Send + 'a,
        F: for<'c> FnOnce(&'c mut Connection, &'c Context) -> BoxFuture<'c, Result<T>>
            + Send
            + 'a,
    {
        Box::pin(async move {
            let _permit = ctx
                .guard(ctx.deadline_or(COMMAND_TIMEOUT), async {
                    self.permits
                        .acquire()
                        .await
                        .map_err(|_| io::Error::other("connection manager closed"))
                })
                .await
                .map_err(|source| self.lease_error(source))?;

            let mut conn = self.lease(ctx).await?;
            match op(&mut conn, ctx).await {
                Ok(value) => {
                    self.checkin(conn).await;
                    Ok(value)
                }
                Err(err) if err.is_broken_connection() => {
                    if self.logging {
                        debug!("Discarding broken connection {}: {}", self.addr(), err);
                    }
                    Err(err)
                }
                Err(err) => {
                    // the exchange completed, the link is still usable
                    self.checkin(conn).await;
                    Err(err)
                }
            }
        })
    }
}

impl<D> fmt::Debug for ConnectionManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("ttl", &self.ttl)
            .field("delay", &self.delay)
            .field("idle", &self.idle.entry_count())
            .field("available", &self.permits.available_permits())
            .finish()
    }
}
