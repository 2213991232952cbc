use std::sync::Arc;

use serde::de::IgnoredAny;
use serde_json::json;

use crate::cache::{QueryCache, QueryKey};
use crate::error::Result;
use crate::http::ApiClient;
use crate::types::{Conversation, MessageItem, NewConversation};

use super::{cached_get, invalidate_all};

/// Conversations and their message threads.
#[derive(Clone)]
pub struct ConversationResources {
    api: Arc<ApiClient>,
    cache: QueryCache,
}

impl ConversationResources {
    pub fn new(api: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn conversations_key() -> QueryKey {
        QueryKey::resource("conversations")
    }

    pub fn messages_key(conversation_id: &str) -> QueryKey {
        QueryKey::resource("messages").with(conversation_id)
    }

    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        cached_get(
            &self.api,
            &self.cache,
            Self::conversations_key(),
            "/conversations".into(),
        )
        .await
    }

    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<MessageItem>> {
        cached_get(
            &self.api,
            &self.cache,
            Self::messages_key(conversation_id),
            format!("/conversations/{conversation_id}/messages"),
        )
        .await
    }

    pub async fn create(&self, conversation: &NewConversation) -> Result<Conversation> {
        let created = self.api.post("/conversations", conversation).await?;
        self.cache.invalidate(&Self::conversations_key());
        Ok(created)
    }

    pub async fn send_message(&self, conversation_id: &str, body: &str) -> Result<MessageItem> {
        let sent = self
            .api
            .post(
                &format!("/conversations/{conversation_id}/messages"),
                &json!({ "body": body }),
            )
            .await?;
        self.touch_thread(conversation_id);
        Ok(sent)
    }

    pub async fn mark_read(&self, conversation_id: &str) -> Result<()> {
        self.api
            .put::<IgnoredAny, _>(&format!("/conversations/{conversation_id}/read"), &json!({}))
            .await?;
        self.cache.invalidate(&Self::conversations_key());
        Ok(())
    }

    pub async fn mute(&self, conversation_id: &str, muted: bool) -> Result<()> {
        self.api
            .put::<IgnoredAny, _>(
                &format!("/conversations/{conversation_id}/mute"),
                &json!({ "muted": muted }),
            )
            .await?;
        self.touch_thread(conversation_id);
        Ok(())
    }

    pub async fn block_participant(
        &self,
        conversation_id: &str,
        user_id: &str,
        blocked: bool,
    ) -> Result<()> {
        self.api
            .put::<IgnoredAny, _>(
                &format!("/conversations/{conversation_id}/block"),
                &json!({ "user_id": user_id, "blocked": blocked }),
            )
            .await?;
        self.touch_thread(conversation_id);
        Ok(())
    }

    fn touch_thread(&self, conversation_id: &str) {
        invalidate_all(
            &self.cache,
            &[Self::conversations_key(), Self::messages_key(conversation_id)],
        );
    }
}
