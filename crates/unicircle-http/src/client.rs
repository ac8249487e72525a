use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use unicircle_collections::CollectionBackend;
use unicircle_core::config::UniCircleConfig;
use unicircle_core::error::UniCircleError;
use unicircle_core::models::collection::{
    Collection, CollectionUpdate, NewCollection, SearchQuery,
};
use unicircle_core::models::ids::{CollectionId, ItemId, UserId};
use unicircle_core::models::item::{normalize_note, CollectionItem, NewItem};
use unicircle_core::rules;

use crate::wire::{
    error_message, AddItemBody, CloneBody, CreateCollectionBody, NoteBody, UpdateCollectionBody,
    WireCollection, WireItem,
};

/// Header carrying the service API key on every request.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// What a request was about; decides how 403/404 are reported.
#[derive(Clone, Copy)]
enum Subject<'a> {
    Collection(&'a CollectionId),
    Item(&'a ItemId),
    CloneSource(&'a CollectionId),
    Service,
}

impl Subject<'_> {
    fn not_found(self) -> UniCircleError {
        match self {
            Subject::Collection(id) => UniCircleError::NotFoundOrForbidden { id: id.to_string() },
            Subject::Item(id) => UniCircleError::ItemNotFound { id: id.to_string() },
            Subject::CloneSource(id) => UniCircleError::NotCloneable { id: id.to_string() },
            Subject::Service => UniCircleError::ApiError {
                status: 404,
                message: "collection service endpoint not found".to_string(),
            },
        }
    }

    fn forbidden(self, message: String) -> UniCircleError {
        match self {
            Subject::Item(_) => UniCircleError::Forbidden { message },
            _ => UniCircleError::AccessDenied { message },
        }
    }
}

/// Collection backend that talks to the remote Collection Service.
pub struct HttpCollectionStore {
    client: reqwest::Client,
    base_url: url::Url,
}

impl HttpCollectionStore {
    pub fn new(
        base_url: url::Url,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, UniCircleError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("unicircle/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|_| UniCircleError::Config {
                message: "API key contains characters not allowed in a header".into(),
            })?;
            headers.insert(API_KEY_HEADER, value);
        } else {
            tracing::warn!("no API key configured; requests will be sent unauthenticated");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| UniCircleError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &UniCircleConfig, api_key: Option<&str>) -> Result<Self, UniCircleError> {
        Self::new(
            config.collection_api_url.clone(),
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        subject: Subject<'_>,
    ) -> Result<Response, UniCircleError> {
        let resp = request.send().await.map_err(|e| UniCircleError::ApiError {
            status: 0,
            message: e.to_string(),
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body);
        tracing::debug!(status = status.as_u16(), %message, "collection service error");

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                UniCircleError::Validation { message }
            }
            StatusCode::UNAUTHORIZED => UniCircleError::Unauthorized {
                message: if message.is_empty() {
                    "missing or invalid API key".to_string()
                } else {
                    message
                },
            },
            StatusCode::FORBIDDEN => subject.forbidden(if message.is_empty() {
                "the service refused this request".to_string()
            } else {
                message
            }),
            StatusCode::NOT_FOUND => subject.not_found(),
            _ => UniCircleError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, UniCircleError> {
        resp.json().await.map_err(|e| UniCircleError::ApiError {
            status: 0,
            message: format!("JSON parse error: {e}"),
        })
    }

    async fn collection(resp: Response) -> Result<Collection, UniCircleError> {
        Collection::try_from(Self::json::<WireCollection>(resp).await?)
    }

    async fn collections(resp: Response) -> Result<Vec<Collection>, UniCircleError> {
        Self::json::<Vec<WireCollection>>(resp)
            .await?
            .into_iter()
            .map(Collection::try_from)
            .collect()
    }
}

#[async_trait]
impl CollectionBackend for HttpCollectionStore {
    async fn list_user_collections(&self, owner: &UserId) -> Result<Vec<Collection>, UniCircleError> {
        let request = self
            .client
            .get(self.url(""))
            .query(&[("userId", owner.as_str())]);
        let resp = self.send(request, Subject::Service).await?;
        let mut collections = Self::collections(resp).await?;
        collections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(collections)
    }

    async fn get_collection(
        &self,
        id: &CollectionId,
        viewer: &UserId,
    ) -> Result<Option<Collection>, UniCircleError> {
        let request = self
            .client
            .get(self.url(&format!("/{id}")))
            .query(&[("userId", viewer.as_str())]);
        match self.send(request, Subject::Collection(id)).await {
            Ok(resp) => Ok(Some(Self::collection(resp).await?)),
            Err(UniCircleError::NotFoundOrForbidden { .. } | UniCircleError::AccessDenied { .. }) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_collection(
        &self,
        owner: &UserId,
        input: NewCollection,
    ) -> Result<Collection, UniCircleError> {
        rules::validate_user(owner)?;
        let input = rules::prepare_new_collection(input)?;
        let request = self
            .client
            .post(self.url(""))
            .json(&CreateCollectionBody::new(&input, owner));
        let resp = self.send(request, Subject::Service).await?;
        Self::collection(resp).await
    }

    async fn update_collection(
        &self,
        id: &CollectionId,
        owner: &UserId,
        update: CollectionUpdate,
    ) -> Result<Collection, UniCircleError> {
        let update = rules::prepare_update(update)?;
        let request = self
            .client
            .put(self.url(&format!("/{id}")))
            .query(&[("userId", owner.as_str())])
            .json(&UpdateCollectionBody::from(&update));
        let resp = self.send(request, Subject::Collection(id)).await?;
        Self::collection(resp).await
    }

    async fn delete_collection(&self, id: &CollectionId, owner: &UserId) -> Result<(), UniCircleError> {
        let request = self
            .client
            .delete(self.url(&format!("/{id}")))
            .query(&[("userId", owner.as_str())]);
        self.send(request, Subject::Collection(id)).await?;
        Ok(())
    }

    async fn add_item(
        &self,
        collection_id: &CollectionId,
        owner: &UserId,
        item: NewItem,
    ) -> Result<CollectionItem, UniCircleError> {
        let item = rules::prepare_new_item(item)?;
        let request = self
            .client
            .post(self.url(&format!("/{collection_id}/items")))
            .query(&[("userId", owner.as_str())])
            .json(&AddItemBody::from(&item));
        let resp = self.send(request, Subject::Collection(collection_id)).await?;
        Self::json::<WireItem>(resp)
            .await?
            .into_item(Some(collection_id))
    }

    async fn update_item_note(
        &self,
        item_id: &ItemId,
        owner: &UserId,
        note: Option<String>,
    ) -> Result<CollectionItem, UniCircleError> {
        let note = normalize_note(note.as_deref());
        let request = self
            .client
            .put(self.url(&format!("/items/{item_id}")))
            .query(&[("userId", owner.as_str())])
            .json(&NoteBody {
                private_note: note.as_deref(),
            });
        let resp = self.send(request, Subject::Item(item_id)).await?;
        Self::json::<WireItem>(resp).await?.into_item(None)
    }

    async fn remove_item(&self, item_id: &ItemId, owner: &UserId) -> Result<(), UniCircleError> {
        let request = self
            .client
            .delete(self.url(&format!("/items/{item_id}")))
            .query(&[("userId", owner.as_str())]);
        self.send(request, Subject::Item(item_id)).await?;
        Ok(())
    }

    async fn search_public_collections(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<Collection>, UniCircleError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = query.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        let tags = rules::normalize_tags(query.tags.clone());
        if !tags.is_empty() {
            params.push(("tags", tags.join(",")));
        }

        if let Some(viewer) = &query.viewer {
            params.push(("userId", viewer.to_string()));
        }

        let request = self.client.get(self.url("/search")).query(&params);
        let resp = self.send(request, Subject::Service).await?;
        // Private results are dropped even if the service returns them.
        let mut found: Vec<Collection> = Self::collections(resp)
            .await?
            .into_iter()
            .filter(|c| c.is_public())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn clone_collection(
        &self,
        id: &CollectionId,
        new_owner: &UserId,
        new_name: Option<String>,
    ) -> Result<Collection, UniCircleError> {
        rules::validate_user(new_owner)?;

        // Resolve the default name here so both backends name clones the same way.
        let source = self
            .get_collection(id, new_owner)
            .await?
            .filter(|c| c.is_public())
            .ok_or_else(|| UniCircleError::NotCloneable { id: id.to_string() })?;

        let request = self
            .client
            .post(self.url(&format!("/{id}/clone")))
            .json(&CloneBody {
                user_id: new_owner.as_str(),
                new_name: rules::clone_name(&source.name, new_name.as_deref()),
            });
        let resp = self.send(request, Subject::CloneSource(id)).await?;
        let status = resp.status().as_u16();
        let clone = Self::collection(resp).await?;
        if clone.is_public() || !clone.is_owned_by(new_owner) {
            tracing::warn!(
                source = %id,
                clone = %clone.id,
                owner = %clone.owner_id,
                visibility = %clone.visibility,
                "service returned a clone that is not private to the caller"
            );
            return Err(UniCircleError::ApiError {
                status,
                message: format!("clone {} is not a private collection owned by {new_owner}", clone.id),
            });
        }
        Ok(clone)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
