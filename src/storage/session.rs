//! Session Redis operations.
//!
//! Redis key patterns:
//! - `session:{token}` — session data (JSON), expires with the session TTL
//!
//! ## Zeroizing
//!
//! Session JSON read back from Redis contains the token, so it is wrapped in
//! `Zeroizing` and cleared once deserialized. Redis keeps its own copy; this
//! only covers the application's memory.

use super::{decode, encode};
use crate::models::StoredSession;
use redis::AsyncCommands;
use zeroize::Zeroizing;

/// Store a session in Redis with TTL.
pub async fn store_session<C>(
    con: &mut C,
    session: &StoredSession,
    ttl_secs: u64,
) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", session.token);
    let json = Zeroizing::new(encode(session)?);

    con.set_ex::<_, _, ()>(&key, json.as_str(), ttl_secs)
        .await?;
    Ok(())
}

/// Get a session by token.
///
/// Expired sessions are gone from Redis, so this returns `None` for them.
pub async fn get_session<C>(
    con: &mut C,
    token: &str,
) -> Result<Option<StoredSession>, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", token);
    let json: Option<String> = con.get(&key).await?;

    match json {
        Some(data) => {
            let data = Zeroizing::new(data);
            Ok(Some(decode(&data)?))
        }
        None => Ok(None),
    }
}

/// Delete a session from Redis.
///
/// Returns true if the session was deleted, false if it didn't exist.
pub async fn delete_session<C>(con: &mut C, token: &str) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", token);
    let deleted: i32 = con.del(&key).await?;
    Ok(deleted > 0)
}
