use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::IgnoredAny;
use serde_json::Value;

use crate::cache::{QueryCache, QueryKey};
use crate::error::Result;
use crate::http::ApiClient;
use crate::types::{
    Announcement, AnnouncementRead, AnnouncementStats, Channel, NewAnnouncement, Priority,
};

use super::{cached_get, invalidate_all};

/// Channels and announcements.
#[derive(Clone)]
pub struct AnnouncementResources {
    api: Arc<ApiClient>,
    cache: QueryCache,
}

impl AnnouncementResources {
    pub fn new(api: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn channels_key() -> QueryKey {
        QueryKey::resource("channels")
    }

    /// `["announcements", channel]`, plus the priority filter when set.
    pub fn announcements_key(channel_id: &str, priority: Option<Priority>) -> QueryKey {
        let key = QueryKey::resource("announcements").with(channel_id);
        match priority {
            Some(p) => key.with(p.to_string()),
            None => key,
        }
    }

    pub fn announcement_key(id: &str) -> QueryKey {
        QueryKey::resource("announcement").with(id)
    }

    pub fn stats_key(id: &str) -> QueryKey {
        QueryKey::resource("announcement-stats").with(id)
    }

    pub async fn channels(&self) -> Result<Vec<Channel>> {
        cached_get(&self.api, &self.cache, Self::channels_key(), "/channels".into()).await
    }

    pub async fn announcements(
        &self,
        channel_id: &str,
        priority: Option<Priority>,
    ) -> Result<Vec<Announcement>> {
        let mut path = format!("/channels/{channel_id}/announcements");
        if let Some(p) = priority {
            path.push_str(&format!("?priority={p}"));
        }
        cached_get(
            &self.api,
            &self.cache,
            Self::announcements_key(channel_id, priority),
            path,
        )
        .await
    }

    /// The school-wide feed, `GET /announcements`.
    pub async fn recent(&self) -> Result<Vec<Announcement>> {
        cached_get(
            &self.api,
            &self.cache,
            QueryKey::resource("announcements"),
            "/announcements".into(),
        )
        .await
    }

    pub async fn announcement(&self, id: &str) -> Result<Announcement> {
        cached_get(
            &self.api,
            &self.cache,
            Self::announcement_key(id),
            format!("/announcements/{id}"),
        )
        .await
    }

    pub async fn stats(&self, id: &str) -> Result<AnnouncementStats> {
        cached_get(
            &self.api,
            &self.cache,
            Self::stats_key(id),
            format!("/announcements/{id}/stats"),
        )
        .await
    }

    pub async fn reads(&self, id: &str) -> Result<Vec<AnnouncementRead>> {
        cached_get(
            &self.api,
            &self.cache,
            QueryKey::resource("announcement-reads").with(id),
            format!("/announcements/{id}/reads"),
        )
        .await
    }

    /// Unfiltered lists already cached for `channel_ids`, merged, newest
    /// first, each announcement once. Never touches the network.
    pub fn merged(&self, channel_ids: &[String]) -> Vec<Announcement> {
        let mut all: Vec<Announcement> = channel_ids
            .iter()
            .filter_map(|id| {
                self.cache
                    .get_as::<Vec<Announcement>>(&Self::announcements_key(id, None))
            })
            .flatten()
            .collect();
        all.sort_by_key(|a| std::cmp::Reverse(a.effective_at()));
        let mut seen = std::collections::HashSet::new();
        all.retain(|a| seen.insert(a.id.clone()));
        all
    }

    /// Record a read, stamp `read_at` on the cached announcement, and
    /// invalidate every list so unread counts refresh.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        self.api
            .post_empty::<IgnoredAny>(&format!("/announcements/{id}/read"))
            .await?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.cache.patch(&Self::announcement_key(id), |cached| {
            if let Some(obj) = cached.as_object_mut() {
                obj.insert("read_at".to_string(), Value::String(now));
            }
        });
        self.cache.invalidate(&QueryKey::resource("announcements"));
        Ok(())
    }

    pub async fn create(&self, announcement: &NewAnnouncement) -> Result<Announcement> {
        let created = self.api.post("/announcements", announcement).await?;
        self.cache.invalidate(&QueryKey::resource("announcements"));
        Ok(created)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api.delete(&format!("/announcements/{id}")).await?;
        invalidate_all(
            &self.cache,
            &[QueryKey::resource("announcements"), Self::announcement_key(id)],
        );
        Ok(())
    }
}
