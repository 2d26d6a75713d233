use std::fmt::Display;

use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Poster(i64),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Poster(movie_id) => write!(f, "poster:{}", movie_id),
        }
    }
}

/// Opens a Redis client. Nothing connects until the first cache operation.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Read-through poster cache
///
/// Reads go straight to Redis. Writes are queued and applied by a single
/// writer task so a slow Redis never delays a response.
#[derive(Clone)]
pub struct Cache {
    client: Client,
    queue: mpsc::UnboundedSender<PendingWrite>,
}

/// What the writer task did before it stopped
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriterStats {
    pub written: usize,
    pub failed: usize,
}

/// Owner of the writer task
///
/// Dropping the handle without calling [`CacheWriterHandle::shutdown`] also
/// stops the writer once the queue is drained, but nothing waits for it.
pub struct CacheWriterHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<WriterStats>,
}

impl CacheWriterHandle {
    /// Applies every queued write, then waits for the writer task to exit
    pub async fn shutdown(self) -> WriterStats {
        let _ = self.stop.send(());

        match self.task.await {
            Ok(stats) => {
                tracing::info!(
                    written = stats.written,
                    failed = stats.failed,
                    "Cache writer stopped"
                );
                stats
            }
            Err(e) => {
                tracing::error!(error = %e, "Cache writer task did not finish cleanly");
                WriterStats::default()
            }
        }
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task on the current runtime
    pub fn new(client: Client) -> (Self, CacheWriterHandle) {
        let (queue, pending) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel();

        let writer = Writer {
            client: client.clone(),
            conn: None,
            stats: WriterStats::default(),
        };
        let task = tokio::spawn(writer.run(pending, stopped));

        (Self { client, queue }, CacheWriterHandle { stop, task })
    }

    /// Returns the cached value for `key`
    ///
    /// An entry that no longer decodes is reported as a miss so the caller
    /// refetches and overwrites it.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key.to_string()).await?;
        Ok(decode_entry(key, raw))
    }

    /// Queues `value` for storage under `key` with a TTL in seconds
    pub fn put<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cannot serialize cache value");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl,
        };
        if self.queue.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}

fn decode_entry<T: DeserializeOwned>(key: &CacheKey, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ignoring unreadable cache entry");
            None
        }
    }
}

/// Single consumer of the write queue; keeps one connection open between
/// writes and reconnects after a failure
struct Writer {
    client: Client,
    conn: Option<redis::aio::MultiplexedConnection>,
    stats: WriterStats,
}

impl Writer {
    async fn run(
        mut self,
        mut pending: mpsc::UnboundedReceiver<PendingWrite>,
        mut stopped: oneshot::Receiver<()>,
    ) -> WriterStats {
        loop {
            tokio::select! {
                next = pending.recv() => match next {
                    Some(write) => self.apply(write).await,
                    None => break,
                },
                _ = &mut stopped => {
                    pending.close();
                    while let Some(write) = pending.recv().await {
                        self.apply(write).await;
                    }
                    break;
                }
            }
        }

        self.stats
    }

    async fn apply(&mut self, write: PendingWrite) {
        match self.set(&write).await {
            Ok(()) => self.stats.written += 1,
            Err(e) => {
                self.conn = None;
                self.stats.failed += 1;
                tracing::warn!(key = %write.key, error = %e, "Cache write failed");
            }
        }
    }

    async fn set(&mut self, write: &PendingWrite) -> redis::RedisResult<()> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.client.get_multiplexed_async_connection().await?,
        };
        let _: () = conn.set_ex(&write.key, &write.value, write.ttl).await?;
        self.conn = Some(conn);
        Ok(())
    }
}
