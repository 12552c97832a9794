//! Post Redis operations.
//!
//! Redis key patterns:
//! - `post:{nanoid}` — post document (JSON)

use super::{decode, encode};
use crate::models::StoredPost;
use redis::AsyncCommands;

/// Store a post document (no TTL).
pub async fn store_post<C>(con: &mut C, post: &StoredPost) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("post:{}", post.id);
    con.set::<_, _, ()>(&key, encode(post)?).await?;
    Ok(())
}

/// Get a post by ID.
pub async fn get_post<C>(con: &mut C, id: &str) -> Result<Option<StoredPost>, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("post:{}", id);
    let json: Option<String> = con.get(&key).await?;

    json.map(|data| decode(&data)).transpose()
}

/// List all posts ordered by creation time.
///
/// Documents that fail to decode are skipped.
pub async fn list_posts<C>(con: &mut C) -> Result<Vec<StoredPost>, redis::RedisError>
where
    C: AsyncCommands,
{
    let mut posts = Vec::new();
    let keys = super::scan_keys(con, "post:*").await?;

    for key in keys {
        let json: Option<String> = con.get(&key).await?;
        if let Some(data) = json {
            match serde_json::from_str::<StoredPost>(&data) {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping undecodable post"),
            }
        }
    }

    posts.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
    Ok(posts)
}

/// Replace title and content of an existing post.
///
/// Read-modify-write runs inside a Lua script so concurrent updates of one
/// post do not interleave. Returns false if the post does not exist.
pub async fn update_post<C>(
    con: &mut C,
    id: &str,
    title: &str,
    content: &str,
    updated_at: u64,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("post:{}", id);

    let script = redis::Script::new(
        r"
        local val = redis.call('GET', KEYS[1])
        if not val then
            return 0
        end
        local doc = cjson.decode(val)
        doc.title = ARGV[1]
        doc.content = ARGV[2]
        doc.updated_at = tonumber(ARGV[3])
        redis.call('SET', KEYS[1], cjson.encode(doc))
        return 1
        ",
    );

    let updated: i32 = script
        .key(&key)
        .arg(title)
        .arg(content)
        .arg(updated_at)
        .invoke_async(con)
        .await?;

    Ok(updated == 1)
}

/// Delete a post.
///
/// Returns true if the post was deleted, false if it didn't exist.
/// Comments referencing the post are kept.
pub async fn delete_post<C>(con: &mut C, id: &str) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("post:{}", id);
    let deleted: i32 = con.del(&key).await?;
    Ok(deleted > 0)
}
