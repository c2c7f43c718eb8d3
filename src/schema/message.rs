use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::database::{error::ErrorExt, Connection, Result};
use crate::types::id::{marker::ChannelMarker, marker::MessageMarker, marker::UserMarker, Id};

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Message {
    pub id: Id<MessageMarker>,
    pub channel_id: Id<ChannelMarker>,
    /// `None` once the sending account has been purged.
    pub sender_id: Option<Id<UserMarker>>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Message {
    /// One page of a channel's history, newest first.
    #[tracing::instrument(skip(channel_id), fields(channel_id = "<hidden>"))]
    pub async fn list_in_channel(
        conn: &mut Connection,
        channel_id: Id<ChannelMarker>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Self>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "messages"
               WHERE channel_id = $1 AND deleted_at IS NULL
               ORDER BY created_at DESC, id DESC
               LIMIT $2 OFFSET $3"#,
        )
        .bind(channel_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(channel_id), fields(channel_id = "<hidden>"))]
    pub async fn count_in_channel(
        conn: &mut Connection,
        channel_id: Id<ChannelMarker>,
    ) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM "messages"
               WHERE channel_id = $1 AND deleted_at IS NULL"#,
        )
        .bind(channel_id)
        .fetch_one(conn)
        .await
        .into_db_error()
    }
}
