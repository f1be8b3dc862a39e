//! Refresh-token session queries.

use crate::error::AppError;
use crate::models::Session;
use sqlx::SqliteConnection;

pub async fn find_session(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<Session>, AppError> {
    let session = sqlx::query_as::<_, Session>(
        "SELECT id, user_id, token, expires_at FROM sessions WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(session)
}

/// Store a refresh token for the user, replacing any previous one.
pub async fn upsert_session(
    conn: &mut SqliteConnection,
    user_id: &str,
    token: &str,
    expires_at: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO sessions (user_id, token, expires_at)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE
        SET token = excluded.token,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn delete_session(
    conn: &mut SqliteConnection,
    user_id: &str,
    token: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE user_id = ? AND token = ?")
        .bind(user_id)
        .bind(token)
        .execute(conn)
        .await?;

    Ok(())
}
