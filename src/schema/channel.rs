use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;

use crate::database::{error::ErrorExt, Connection, Result};
use crate::types::id::{marker::ChannelMarker, marker::UserMarker, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Direct,
    Group,
    Broadcast,
}

impl ChannelType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
            Self::Broadcast => "broadcast",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown channel type")]
pub struct ParseChannelTypeError;

impl FromStr for ChannelType {
    type Err = ParseChannelTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "group" => Ok(Self::Group),
            "broadcast" => Ok(Self::Broadcast),
            _ => Err(ParseChannelTypeError),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for ChannelType {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for ChannelType {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
    ) -> sqlx::encode::IsNull {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ChannelType {
    fn decode(
        value: <sqlx::Postgres as sqlx::database::HasValueRef<'r>>::ValueRef,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let value = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(value.parse::<Self>()?)
    }
}

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Channel {
    pub id: Id<ChannelMarker>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub name: String,
    pub channel_type: ChannelType,
    pub category: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
}

/// Result of a membership mutation. Both outcomes leave the
/// relation holding exactly one row for the pair, which is what
/// makes the operations idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    AlreadyMember,
    Removed,
    NotMember,
}

impl Channel {
    #[tracing::instrument(skip(id), fields(id = "<hidden>"))]
    pub async fn find(conn: &mut Connection, id: Id<ChannelMarker>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "channels" WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    /// Every channel ordered by name. Soft-deleted rows only show
    /// up when `include_deleted` is set.
    #[tracing::instrument(skip(conn))]
    pub async fn list_all(conn: &mut Connection, include_deleted: bool) -> Result<Vec<Self>> {
        let query = if include_deleted {
            r#"SELECT * FROM "channels" ORDER BY name"#
        } else {
            r#"SELECT * FROM "channels" WHERE deleted_at IS NULL ORDER BY name"#
        };

        sqlx::query_as::<_, Self>(query)
            .fetch_all(conn)
            .await
            .into_db_error()
    }

    /// Live channels the given user is a member of, ordered by
    /// name.
    #[tracing::instrument(skip(user_id), fields(user_id = "<hidden>"))]
    pub async fn list_for_member(
        conn: &mut Connection,
        user_id: Id<UserMarker>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"SELECT c.* FROM "channels" c
               INNER JOIN "channel_members" m ON m.channel_id = c.id
               WHERE m.user_id = $1 AND c.deleted_at IS NULL
               ORDER BY c.name"#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(channel_id, user_id), fields(channel_id = "<hidden>", user_id = "<hidden>"))]
    pub async fn is_member(
        conn: &mut Connection,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                 SELECT 1 FROM "channel_members"
                 WHERE channel_id = $1 AND user_id = $2
               )"#,
        )
        .bind(channel_id)
        .bind(user_id)
        .fetch_one(conn)
        .await
        .into_db_error()
    }

    /// Member identifiers in join order.
    #[tracing::instrument(skip(channel_id), fields(channel_id = "<hidden>"))]
    pub async fn members(
        conn: &mut Connection,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Vec<Id<UserMarker>>> {
        sqlx::query_scalar::<_, Id<UserMarker>>(
            r#"SELECT user_id FROM "channel_members"
               WHERE channel_id = $1
               ORDER BY added_at, user_id"#,
        )
        .bind(channel_id)
        .fetch_all(conn)
        .await
        .into_db_error()
    }

    /// Adds a user to the channel. The uniqueness constraint on
    /// `(channel_id, user_id)` makes this a single idempotent
    /// insert; there is no read-modify-write involved. Returns
    /// `None` when the channel does not exist or is soft-deleted.
    #[tracing::instrument(skip(channel_id, user_id), fields(channel_id = "<hidden>", user_id = "<hidden>"))]
    pub async fn add_member(
        conn: &mut Connection,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Option<MembershipChange>> {
        if Self::find(&mut *conn, channel_id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"INSERT INTO "channel_members" (channel_id, user_id, added_at)
               VALUES ($1, $2, $3)
               ON CONFLICT (channel_id, user_id) DO NOTHING"#,
        )
        .bind(channel_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *conn)
        .await
        .into_db_error()?;

        if result.rows_affected() == 0 {
            return Ok(Some(MembershipChange::AlreadyMember));
        }

        sqlx::query(r#"UPDATE "channels" SET updated_at = $2 WHERE id = $1"#)
            .bind(channel_id)
            .bind(now)
            .execute(conn)
            .await
            .into_db_error()?;

        Ok(Some(MembershipChange::Added))
    }

    /// Removes a user from the channel. Removing a non-member is a
    /// no-op reported as such.
    #[tracing::instrument(skip(channel_id, user_id), fields(channel_id = "<hidden>", user_id = "<hidden>"))]
    pub async fn remove_member(
        conn: &mut Connection,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Option<MembershipChange>> {
        if Self::find(&mut *conn, channel_id).await?.is_none() {
            return Ok(None);
        }

        let result = sqlx::query(
            r#"DELETE FROM "channel_members" WHERE channel_id = $1 AND user_id = $2"#,
        )
        .bind(channel_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .into_db_error()?;

        if result.rows_affected() == 0 {
            return Ok(Some(MembershipChange::NotMember));
        }

        sqlx::query(r#"UPDATE "channels" SET updated_at = $2 WHERE id = $1"#)
            .bind(channel_id)
            .bind(Utc::now().naive_utc())
            .execute(conn)
            .await
            .into_db_error()?;

        Ok(Some(MembershipChange::Removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_parse_round_trip() {
        for channel_type in [
            ChannelType::Direct,
            ChannelType::Group,
            ChannelType::Broadcast,
        ] {
            assert_eq!(
                Ok(channel_type),
                channel_type.as_str().parse().map_err(|_| ())
            );
        }
        assert!("dm".parse::<ChannelType>().is_err());
    }
}
