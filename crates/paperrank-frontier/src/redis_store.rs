//! Redis-backed frontier store
//!
//! Each collection is one Redis key named after it (`EXPLORE`, `OUT`, ...),
//! a set or a hash depending on its kind. Commands go through a multiplexed
//! async connection driven by the shared runtime, so any worker thread can
//! issue them concurrently.

use paperrank_core::SHARED_RUNTIME;
use redis::aio::MultiplexedConnection;
use redis::{FromRedisValue, Script};

use crate::changeset::{Changeset, Mutation};
use crate::collection::{Collection, CollectionKind};
use crate::error::StoreError;
use crate::store::{FrontierStore, require_map, require_set};

/// Pop up to ARGV[1] members of KEYS[1] and add them to KEYS[2] in one step.
///
/// SPOP with a count inside a script needs Redis 5+ (effects replication).
/// `unpack` is bounded by the Lua C stack (~8000 values), so SADD goes in
/// chunks of ARGV[2].
const CLAIM_INTO_SCRIPT: &str = r"
local claimed = redis.call('SPOP', KEYS[1], ARGV[1])
local chunk = tonumber(ARGV[2])
for i = 1, #claimed, chunk do
  redis.call('SADD', KEYS[2], unpack(claimed, i, math.min(i + chunk - 1, #claimed)))
end
return claimed
";

/// Members per SADD inside the claim script
const CLAIM_CHUNK: usize = 1000;

/// Connection parameters
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Logical database index
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Command names for one collection kind
struct KindCommands {
    contains: &'static str,
    size: &'static str,
    remove: &'static str,
    members: &'static str,
}

const SET_COMMANDS: KindCommands = KindCommands {
    contains: "SISMEMBER",
    size: "SCARD",
    remove: "SREM",
    members: "SMEMBERS",
};

const MAP_COMMANDS: KindCommands = KindCommands {
    contains: "HEXISTS",
    size: "HLEN",
    remove: "HDEL",
    members: "HKEYS",
};

fn commands(kind: CollectionKind) -> &'static KindCommands {
    match kind {
        CollectionKind::Set => &SET_COMMANDS,
        CollectionKind::Map => &MAP_COMMANDS,
    }
}

/// Frontier store on a Redis database.
pub struct RedisStore {
    conn: MultiplexedConnection,
    claim_script: Script,
}

impl RedisStore {
    /// Connect and ping; any failure is reported as [`StoreError::Unavailable`].
    pub fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let url = config.url();
        let client = redis::Client::open(url.as_str())
            .map_err(|e| StoreError::Unavailable(format!("invalid Redis URL {url}: {e}")))?;

        let conn = SHARED_RUNTIME
            .handle()
            .block_on(client.get_multiplexed_async_connection())
            .map_err(|e| StoreError::Unavailable(format!("cannot connect to {url}: {e}")))?;

        let store = Self {
            conn,
            claim_script: Script::new(CLAIM_INTO_SCRIPT),
        };
        store
            .ping()
            .map_err(|e| StoreError::Unavailable(format!("{url}: {e}")))?;
        log::debug!("Connected to Redis at {url}");
        Ok(store)
    }

    fn query<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, StoreError> {
        let mut conn = self.conn.clone();
        let value = SHARED_RUNTIME.handle().block_on(cmd.query_async(&mut conn))?;
        Ok(value)
    }

    /// Translate a changeset into one MULTI/EXEC transaction.
    fn pipeline(changes: &Changeset) -> redis::Pipeline {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for mutation in changes.mutations() {
            match mutation {
                Mutation::Add {
                    collection,
                    members,
                } => {
                    pipe.cmd("SADD").arg(collection.name()).arg(members).ignore();
                }
                Mutation::Put {
                    collection,
                    entries,
                } => {
                    pipe.cmd("HSET").arg(collection.name());
                    for (key, value) in entries {
                        pipe.arg(key).arg(value);
                    }
                    pipe.ignore();
                }
                Mutation::Remove { collection, keys } => {
                    pipe.cmd(commands(collection.kind()).remove)
                        .arg(collection.name())
                        .arg(keys)
                        .ignore();
                }
                Mutation::Subtract { collection, other } => {
                    pipe.cmd("SDIFFSTORE")
                        .arg(collection.name())
                        .arg(collection.name())
                        .arg(other.name())
                        .ignore();
                }
                Mutation::MoveAll { from, to } => {
                    pipe.cmd("SUNIONSTORE")
                        .arg(to.name())
                        .arg(to.name())
                        .arg(from.name())
                        .ignore();
                    pipe.cmd("DEL").arg(from.name()).ignore();
                }
            }
        }
        pipe
    }
}

impl FrontierStore for RedisStore {
    fn ping(&self) -> Result<(), StoreError> {
        let _: String = self.query(&redis::cmd("PING"))?;
        Ok(())
    }

    fn contains(&self, collection: Collection, key: &str) -> Result<bool, StoreError> {
        let cmds = commands(collection.kind());
        self.query(redis::cmd(cmds.contains).arg(collection.name()).arg(key))
    }

    fn claim(&self, collection: Collection, n: usize) -> Result<Vec<String>, StoreError> {
        require_set("claim", collection)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        // SPOP with a count selects and removes in a single command
        self.query(redis::cmd("SPOP").arg(collection.name()).arg(n))
    }

    fn claim_into(
        &self,
        from: Collection,
        to: Collection,
        n: usize,
    ) -> Result<Vec<String>, StoreError> {
        require_set("claim", from)?;
        require_set("claim", to)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let mut invocation = self.claim_script.prepare_invoke();
        invocation
            .key(from.name())
            .key(to.name())
            .arg(n)
            .arg(CLAIM_CHUNK);
        let claimed: Vec<String> = SHARED_RUNTIME
            .handle()
            .block_on(invocation.invoke_async(&mut conn))?;
        Ok(claimed)
    }

    fn size(&self, collection: Collection) -> Result<usize, StoreError> {
        let cmds = commands(collection.kind());
        self.query(redis::cmd(cmds.size).arg(collection.name()))
    }

    fn is_empty(&self, collection: Collection) -> Result<bool, StoreError> {
        // Redis deletes empty sets and hashes, so key existence is emptiness
        let exists: bool = self.query(redis::cmd("EXISTS").arg(collection.name()))?;
        Ok(!exists)
    }

    fn members(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        let cmds = commands(collection.kind());
        self.query(redis::cmd(cmds.members).arg(collection.name()))
    }

    fn get(&self, collection: Collection, key: &str) -> Result<Option<String>, StoreError> {
        require_map("get", collection)?;
        self.query(redis::cmd("HGET").arg(collection.name()).arg(key))
    }

    fn apply(&self, changes: &Changeset) -> Result<(), StoreError> {
        changes.validate()?;
        if changes.is_empty() {
            return Ok(());
        }
        let pipe = Self::pipeline(changes);
        let mut conn = self.conn.clone();
        let (): () = SHARED_RUNTIME
            .handle()
            .block_on(pipe.query_async(&mut conn))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_url() {
        let config = RedisConfig {
            host: "cache.local".into(),
            port: 6380,
            db: 2,
        };
        assert_eq!(config.url(), "redis://cache.local:6380/2");
        assert_eq!(RedisConfig::default().url(), "redis://localhost:6379/0");
    }

    #[test]
    fn commands_follow_kind() {
        assert_eq!(commands(CollectionKind::Set).contains, "SISMEMBER");
        assert_eq!(commands(CollectionKind::Map).contains, "HEXISTS");
        assert_eq!(commands(CollectionKind::Map).remove, "HDEL");
    }

    #[test]
    fn pipeline_wraps_commands_in_transaction() {
        let mut changes = Changeset::new();
        changes
            .add(Collection::Seen, ["1"])
            .put(Collection::Out, [("1", r#"["2"]"#)])
            .subtract(Collection::Explore, Collection::Seen)
            .move_all(Collection::Instance, Collection::Explore);
        let packed = String::from_utf8_lossy(&RedisStore::pipeline(&changes).get_packed_pipeline())
            .into_owned();
        assert!(packed.contains("MULTI"));
        assert!(packed.contains("EXEC"));
        for word in ["SADD", "HSET", "SDIFFSTORE", "SUNIONSTORE", "DEL"] {
            assert!(packed.contains(word), "missing {word}");
        }
    }
}
