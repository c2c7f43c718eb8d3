use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::schema::channel::ChannelType;
use crate::schema::{Channel, Message};
use crate::types::id::{marker::ChannelMarker, marker::MessageMarker, marker::UserMarker, Id};

pub mod list;
pub mod messages;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelView {
    pub id: Id<ChannelMarker>,
    pub name: String,
    pub channel_type: ChannelType,
    pub category: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<&Channel> for ChannelView {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name.clone(),
            channel_type: channel.channel_type,
            category: channel.category.clone(),
            created_at: channel.created_at,
            updated_at: channel.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageView {
    pub id: Id<MessageMarker>,
    pub channel_id: Id<ChannelMarker>,
    pub sender_id: Option<Id<UserMarker>>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}
