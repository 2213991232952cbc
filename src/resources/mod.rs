//! Cached reads and invalidating mutations over the BellBook resources.
//!
//! Reads go through the [`QueryCache`]; mutations hit the API and then
//! invalidate the keys whose server state they changed.

mod announcements;
mod conversations;

pub use announcements::AnnouncementResources;
pub use conversations::ConversationResources;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{FetchOptions, QueryCache, QueryKey};
use crate::error::Result;
use crate::http::ApiClient;

async fn cached_get<T: DeserializeOwned>(
    api: &Arc<ApiClient>,
    cache: &QueryCache,
    key: QueryKey,
    path: String,
) -> Result<T> {
    let api = api.clone();
    cache
        .fetch_as(&key, FetchOptions::default(), move || {
            let api = api.clone();
            let path = path.clone();
            async move { api.get::<Value>(&path).await }
        })
        .await
}

fn invalidate_all(cache: &QueryCache, keys: &[QueryKey]) {
    for key in keys {
        cache.invalidate(key);
    }
}
