//! API users and tokens

use dunya_common::checksum::sha256_hex;
use sqlx::PgPool;
use uuid::Uuid;

use super::DbResult;
use crate::docserver::access::Viewer;

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    is_staff: bool,
    can_access_restricted: bool,
}

/// Tokens are stored as the hex SHA-256 of the key
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Find the user owning an API token
pub async fn viewer_for_token(pool: &PgPool, token: &str) -> DbResult<Option<Viewer>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT u.id, u.is_staff, u.can_access_restricted
         FROM api_tokens t
         JOIN users u ON u.id = t.user_id
         WHERE t.token_hash = $1",
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|u| Viewer {
        user_id: Some(u.id),
        is_staff: u.is_staff,
        can_access_restricted: u.can_access_restricted,
    }))
}

/// Create a user with a token. Used by tests and bootstrap scripts.
pub async fn create_user_with_token(
    pool: &PgPool,
    username: &str,
    is_staff: bool,
    can_access_restricted: bool,
    token: &str,
) -> DbResult<Uuid> {
    let mut tx = pool.begin().await?;

    let user_id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (username, is_staff, can_access_restricted)
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(username)
    .bind(is_staff)
    .bind(can_access_restricted)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO api_tokens (token_hash, user_id) VALUES ($1, $2)")
        .bind(hash_token(token))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token() {
        let hash = hash_token("secret");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("secret"));
        assert_ne!(hash, hash_token("Secret"));
    }
}
