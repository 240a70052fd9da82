use serde::Deserialize;
use serde_json::Value;

use crate::streaks::{ContentType, InboundEvent};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

// Only the fields the tracker consumes are modeled, serde skips the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Value>,
    #[serde(default)]
    pub video: Option<Value>,
    #[serde(default)]
    pub document: Option<Value>,
    #[serde(default)]
    pub audio: Option<Value>,
    #[serde(default)]
    pub voice: Option<Value>,
    #[serde(default)]
    pub video_note: Option<Value>,
    #[serde(default)]
    pub sticker: Option<Value>,
    #[serde(default)]
    pub animation: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: String,
}

impl Message {
    /// Telegram marks an animation as both `document` and `animation`, so
    /// `animation` must be checked before `document`.
    pub fn content_type(&self) -> ContentType {
        if self.text.is_some() {
            ContentType::Text
        } else if self.photo.is_some() {
            ContentType::Photo
        } else if self.animation.is_some() {
            ContentType::Animation
        } else if self.video.is_some() {
            ContentType::Video
        } else if self.document.is_some() {
            ContentType::Document
        } else if self.audio.is_some() {
            ContentType::Audio
        } else if self.voice.is_some() {
            ContentType::Voice
        } else if self.video_note.is_some() {
            ContentType::VideoNote
        } else if self.sticker.is_some() {
            ContentType::Sticker
        } else {
            ContentType::Other
        }
    }

    /// Detaches the transport message into the tracker's event type.
    /// Messages without a sender (channel posts, service updates) are
    /// dropped here.
    pub fn to_inbound_event(&self) -> Option<InboundEvent> {
        let from = self.from.as_ref()?;
        Some(InboundEvent {
            chat_id: self.chat.id,
            chat_title: self.chat.title.clone(),
            content_type: self.content_type(),
            text: self.text.clone(),
            user_id: from.id,
            username: from.username.clone(),
            first_name: from.first_name.clone(),
        })
    }
}
