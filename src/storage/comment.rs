//! Comment Redis operations.
//!
//! Redis key patterns:
//! - `comment:{nanoid}` — comment document (JSON)

use super::encode;
use crate::models::StoredComment;
use redis::AsyncCommands;

/// Store a comment document (no TTL).
pub async fn store_comment<C>(con: &mut C, comment: &StoredComment) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("comment:{}", comment.id);
    con.set::<_, _, ()>(&key, encode(comment)?).await?;
    Ok(())
}

/// List all comments ordered by creation time.
pub async fn list_comments<C>(con: &mut C) -> Result<Vec<StoredComment>, redis::RedisError>
where
    C: AsyncCommands,
{
    let mut comments = Vec::new();
    let keys = super::scan_keys(con, "comment:*").await?;

    for key in keys {
        let json: Option<String> = con.get(&key).await?;
        if let Some(data) = json {
            match serde_json::from_str::<StoredComment>(&data) {
                Ok(comment) => comments.push(comment),
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping undecodable comment"),
            }
        }
    }

    comments.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
    Ok(comments)
}

/// Replace the content of an existing comment.
///
/// Returns false if the comment does not exist.
pub async fn update_comment<C>(
    con: &mut C,
    id: &str,
    content: &str,
    updated_at: u64,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("comment:{}", id);

    let script = redis::Script::new(
        r"
        local val = redis.call('GET', KEYS[1])
        if not val then
            return 0
        end
        local doc = cjson.decode(val)
        doc.content = ARGV[1]
        doc.updated_at = tonumber(ARGV[2])
        redis.call('SET', KEYS[1], cjson.encode(doc))
        return 1
        ",
    );

    let updated: i32 = script
        .key(&key)
        .arg(content)
        .arg(updated_at)
        .invoke_async(con)
        .await?;

    Ok(updated == 1)
}

/// Delete a comment.
///
/// Returns true if the comment was deleted, false if it didn't exist.
pub async fn delete_comment<C>(con: &mut C, id: &str) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let key = format!("comment:{}", id);
    let deleted: i32 = con.del(&key).await?;
    Ok(deleted > 0)
}
