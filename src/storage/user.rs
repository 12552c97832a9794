//! User (credential record) Redis operations.
//!
//! Redis key patterns:
//! - `user:{nanoid}` — user data (JSON)
//! - `username:{username}` — username lookup to user_id (STRING)
//!
//! Usernames are stored verbatim, so lookups are case-sensitive exact matches.

use super::{decode, encode};
use crate::models::StoredUser;
use redis::AsyncCommands;

/// Create a user only if the username is free.
///
/// A Lua script claims `username:{username}` with SETNX and writes the user
/// document in the same step, so concurrent registrations of one username
/// cannot both succeed. Returns false if the username was already taken.
pub async fn create_user<C>(con: &mut C, user: &StoredUser) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let user_key = format!("user:{}", user.id);
    let username_key = format!("username:{}", user.username);
    let json = encode(user)?;

    let script = redis::Script::new(
        r"
        if redis.call('SETNX', KEYS[1], ARGV[1]) == 0 then
            return 0
        end
        redis.call('SET', KEYS[2], ARGV[2])
        return 1
        ",
    );

    let created: i32 = script
        .key(&username_key)
        .key(&user_key)
        .arg(&user.id)
        .arg(json)
        .invoke_async(con)
        .await?;

    Ok(created == 1)
}

/// Get a user by ID.
pub async fn get_user<C>(con: &mut C, id: &str) -> Result<Option<StoredUser>, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("user:{}", id);
    let json: Option<String> = con.get(&key).await?;

    json.map(|data| decode(&data)).transpose()
}

/// Get a user by username.
///
/// Performs a two-step lookup: username -> user_id -> user data.
pub async fn get_user_by_username<C>(
    con: &mut C,
    username: &str,
) -> Result<Option<StoredUser>, redis::RedisError>
where
    C: AsyncCommands,
{
    let username_key = format!("username:{}", username);
    let user_id: Option<String> = con.get(&username_key).await?;

    match user_id {
        Some(id) => get_user(con, &id).await,
        None => Ok(None),
    }
}
