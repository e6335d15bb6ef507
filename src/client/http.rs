//! HTTP seam: one request in, one parsed response out. No retries at this level.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::client::error::{ApiError, MeError};
use crate::domain::AccessToken;

pub(crate) const DEFAULT_BASE_URL: &str = "https://app.mobile.me.app";
pub(crate) const DEFAULT_USER_AGENT: &str = "okhttp/4.9.1";
const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// HTTP methods accepted by the Me API.
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(value: Method) -> Self {
        match value {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    /// Raw access token for the `authorization` header.
    pub(crate) authorization: Option<String>,
    pub(crate) body: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct HttpResponse {
    pub(crate) status: u16,
    pub(crate) reason: Option<String>,
    pub(crate) body: String,
}

pub(crate) trait HttpTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
pub(crate) struct ReqwestTransport {
    pub(crate) client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.into(), request.url)
                .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE);
            if let Some(token) = request.authorization {
                builder = builder.header(reqwest::header::AUTHORIZATION, token);
            }
            if let Some(body) = request.body.as_ref() {
                builder = builder.json(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let reason = status.canonical_reason().map(str::to_owned);
            let body = response.text().await?;
            Ok(HttpResponse {
                status: status.as_u16(),
                reason,
                body,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A response whose body parsed as JSON, whatever its status.
pub(crate) struct ApiResponse {
    pub(crate) status: u16,
    pub(crate) reason: Option<String>,
    pub(crate) body: Value,
}

impl ApiResponse {
    /// Map statuses >= 400 to [`MeError::Api`]; return the body otherwise.
    pub(crate) fn into_result(self) -> Result<Value, MeError> {
        if self.status >= 400 {
            return Err(ApiError::from_body(self.status, self.reason, self.body).into());
        }
        Ok(self.body)
    }
}

#[derive(Clone)]
/// Builds and sends exactly one request against the configured base URL.
pub(crate) struct Dispatcher {
    base_url: Url,
    http: Arc<dyn HttpTransport>,
}

impl Dispatcher {
    pub(crate) fn new(base_url: Url, http: Arc<dyn HttpTransport>) -> Self {
        Self { base_url, http }
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send one request. Transport failures and non-JSON bodies are errors; HTTP error
    /// statuses are not (see [`ApiResponse::into_result`]).
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse, MeError> {
        let url = self.url(path)?;
        tracing::debug!(%method, path, authorized = token.is_some(), "sending request");

        let response = self
            .http
            .send(HttpRequest {
                method,
                url,
                authorization: token.map(|t| t.as_str().to_owned()),
                body: body.cloned(),
            })
            .await
            .map_err(MeError::Transport)?;
        tracing::debug!(%method, path, status = response.status, "received response");

        let parsed = parse_body(response.status, &response.body)?;
        Ok(ApiResponse {
            status: response.status,
            reason: response.reason,
            body: parsed,
        })
    }

    fn url(&self, path: &str) -> Result<Url, MeError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }
}

fn parse_body(status: u16, body: &str) -> Result<Value, MeError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|source| MeError::MalformedResponse {
        status,
        body: body.to_owned(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::fake::FakeTransport;
    use super::*;

    #[tokio::test]
    async fn send_attaches_raw_token_and_body() {
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({"ok": true}));
        let dispatcher = transport.dispatcher();
        let token = AccessToken::new("tok").unwrap();
        let body = json!({"a": 1});

        let response = dispatcher
            .send(Method::Post, "/main/x/", Some(&body), Some(&token))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"ok": true}));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "https://example.invalid/main/x/");
        assert_eq!(requests[0].authorization.as_deref(), Some("tok"));
        assert_eq!(requests[0].body, Some(body));
    }

    #[tokio::test]
    async fn send_keeps_query_string() {
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({}));
        transport
            .dispatcher()
            .send(Method::Get, "/main/contacts/search/?phone_number=123456789", None, None)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(
            requests[0].path(),
            "/main/contacts/search/?phone_number=123456789"
        );
        assert_eq!(requests[0].authorization, None);
    }

    #[tokio::test]
    async fn send_maps_invalid_json_to_malformed_response() {
        let transport = FakeTransport::new();
        transport.respond(502, "<html>bad gateway</html>");

        let err = transport
            .dispatcher()
            .send(Method::Get, "/x", None, None)
            .await
            .unwrap_err();
        match err {
            MeError::MalformedResponse { status, body, .. } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_maps_transport_failure() {
        let transport = FakeTransport::new();
        transport.fail("connection reset");

        let err = transport
            .dispatcher()
            .send(Method::Get, "/x", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, MeError::Transport(_)));
    }

    #[tokio::test]
    async fn empty_body_parses_as_null() {
        let transport = FakeTransport::new();
        transport.respond(204, "");

        let response = transport
            .dispatcher()
            .send(Method::Delete, "/x", None, None)
            .await
            .unwrap();
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn into_result_maps_error_statuses() {
        let response = ApiResponse {
            status: 404,
            reason: Some("Not Found".to_owned()),
            body: json!({"detail": "Not found."}),
        };
        match response.into_result().unwrap_err() {
            MeError::Api(api) => {
                assert!(api.is(404, "Not found."));
                assert_eq!(api.reason.as_deref(), Some("Not Found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
