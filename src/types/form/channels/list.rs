use serde::{Deserialize, Serialize};

use super::ChannelView;

#[derive(Debug, Deserialize, Serialize)]
pub struct Response {
    pub data: Vec<ChannelView>,
}
