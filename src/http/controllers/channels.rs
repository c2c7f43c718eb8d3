use actix_web::{web, HttpResponse};
use thiserror::Error;

use crate::http::{Actor, Error};
use crate::schema::{Channel, Message};
use crate::types;
use crate::types::form::channels::{list, messages, ChannelView, MessageView};
use crate::types::id::{marker::ChannelMarker, Id};
use crate::App;

/// Channels visible to the caller: all live channels for roles
/// that oversee everything, membership only for everyone else.
#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;

    let mut conn = app.db_read().await?;
    let channels = if user.role.can_view_all_channels() {
        Channel::list_all(&mut conn, false).await?
    } else {
        Channel::list_for_member(&mut conn, user.id).await?
    };

    Ok(HttpResponse::Ok().json(list::Response {
        data: channels.iter().map(ChannelView::from).collect(),
    }))
}

/// One page of a channel's message history, newest first.
#[tracing::instrument(skip_all)]
pub async fn messages(
    app: web::Data<App>,
    actor: Actor,
    path: web::Path<Id<ChannelMarker>>,
    query: web::Query<messages::Query>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;
    let channel_id = path.into_inner();

    let mut conn = app.db_read().await?;
    let Some(channel) = Channel::find(&mut conn, channel_id).await? else {
        #[derive(Debug, Error)]
        #[error("Channel not found")]
        struct ChannelNotFound;
        return Err(Error::from_context(types::Error::NotFound, ChannelNotFound));
    };

    let allowed = user.role.can_view_all_channels()
        || Channel::is_member(&mut conn, channel.id, user.id).await?;
    if !allowed {
        #[derive(Debug, Error)]
        #[error("Attempt to read a channel without membership")]
        struct NotAMember;
        return Err(Error::from_context(types::Error::Forbidden, NotAMember));
    }

    let page = query.page();
    let limit = query.limit();
    let total = Message::count_in_channel(&mut conn, channel.id).await?;
    let data = Message::list_in_channel(&mut conn, channel.id, page, limit).await?;

    Ok(HttpResponse::Ok().json(messages::Response {
        data: data.iter().map(MessageView::from).collect(),
        pagination: messages::Pagination::new(page, limit, total),
    }))
}
