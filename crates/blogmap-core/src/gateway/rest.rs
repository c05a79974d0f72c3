//! reqwest implementation of [`BlogBackend`] for the `/api/v0` REST surface.

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{BlogBackend, GENERIC_ERROR_MESSAGE, GatewayError, GatewayFuture};
use crate::model::{Author, AuthorDraft, AuthorId, Listing, Paper, PaperDraft, PaperId};

const PAPER: &str = "paper";
const AUTHOR: &str = "author";

/// Single-record responses come either wrapped in `{ "data": ... }` or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(inner) => inner,
        }
    }
}

/// HTTP gateway backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpGateway {
    client: Client,
}

impl HttpGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn listing<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<Listing<T>, GatewayError> {
        let resp = send(req).await?;
        decode_response(resp).await
    }

    async fn record<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, GatewayError> {
        let resp = send(req).await?;
        decode_response::<Envelope<T>>(resp)
            .await
            .map(Envelope::into_inner)
    }
}

/// Build `<base>/api/v0/<segments...>`, percent-encoding each segment.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, GatewayError> {
    let base = base.trim();
    if base.is_empty() {
        return Err(GatewayError::NoBackend);
    }
    let mut url = Url::parse(base)
        .map_err(|e| GatewayError::Transport(format!("invalid backend URI `{base}`: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| GatewayError::Transport(format!("backend URI `{base}` cannot be a base")))?
        .pop_if_empty()
        .extend(["api", "v0"])
        .extend(segments);
    Ok(url)
}

async fn send(req: RequestBuilder) -> Result<Response, GatewayError> {
    req.send()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))
}

/// Decode a successful body as `T`, or translate an error status.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    resp: Response,
) -> Result<T, GatewayError> {
    let status = resp.status();
    tracing::debug!(url = %resp.url(), status = status.as_u16(), "backend response");
    if !status.is_success() {
        return Err(error_from_response(resp).await);
    }
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Turn a non-2xx response into [`GatewayError::Backend`].
pub(crate) async fn error_from_response(resp: Response) -> GatewayError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    GatewayError::Backend {
        status,
        message: backend_message(&body).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
    }
}

/// Extract the backend's message from an error body.
///
/// The backend answers `{ "err": "..." }`; validation failures may carry an
/// error object under `err` with its own `message`.
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let from_err = match &value["err"] {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => obj
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    from_err
        .or_else(|| value["message"].as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}

impl BlogBackend for HttpGateway {
    fn list_papers<'a>(&'a self, base: &'a str) -> GatewayFuture<'a, Listing<Paper>> {
        Box::pin(async move {
            let url = endpoint(base, &[PAPER])?;
            self.listing(self.client.get(url)).await
        })
    }

    fn create_paper<'a>(
        &'a self,
        base: &'a str,
        draft: &'a PaperDraft,
    ) -> GatewayFuture<'a, Paper> {
        Box::pin(async move {
            let url = endpoint(base, &[PAPER])?;
            self.record(self.client.post(url).json(draft)).await
        })
    }

    fn update_paper<'a>(
        &'a self,
        base: &'a str,
        id: &'a PaperId,
        patch: &'a PaperDraft,
    ) -> GatewayFuture<'a, Paper> {
        Box::pin(async move {
            let url = endpoint(base, &[PAPER, id.as_str()])?;
            self.record(self.client.patch(url).json(patch)).await
        })
    }

    fn delete_paper<'a>(&'a self, base: &'a str, id: &'a PaperId) -> GatewayFuture<'a, Paper> {
        Box::pin(async move {
            let url = endpoint(base, &[PAPER, id.as_str()])?;
            self.record(self.client.delete(url)).await
        })
    }

    fn list_authors<'a>(&'a self, base: &'a str) -> GatewayFuture<'a, Listing<Author>> {
        Box::pin(async move {
            let url = endpoint(base, &[AUTHOR])?;
            self.listing(self.client.get(url)).await
        })
    }

    fn create_author<'a>(
        &'a self,
        base: &'a str,
        draft: &'a AuthorDraft,
    ) -> GatewayFuture<'a, Author> {
        Box::pin(async move {
            let url = endpoint(base, &[AUTHOR])?;
            self.record(self.client.post(url).json(draft)).await
        })
    }

    fn update_author<'a>(
        &'a self,
        base: &'a str,
        id: &'a AuthorId,
        patch: &'a AuthorDraft,
    ) -> GatewayFuture<'a, Author> {
        Box::pin(async move {
            let url = endpoint(base, &[AUTHOR, id.as_str()])?;
            self.record(self.client.patch(url).json(patch)).await
        })
    }

    fn delete_author<'a>(
        &'a self,
        base: &'a str,
        id: &'a AuthorId,
    ) -> GatewayFuture<'a, Author> {
        Box::pin(async move {
            let url = endpoint(base, &[AUTHOR, id.as_str()])?;
            self.record(self.client.delete(url)).await
        })
    }
}
