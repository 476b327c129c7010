//! `hubcache fetch`: run one request through the activated worker.

use http::Method;
use hubcache_core::{Error, FetchOutcome, PassthroughReason, Request, RequestMode, ResponseSource};
use serde::Serialize;

use super::Context;

/// Parameters for the fetch command.
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// Absolute URL or a path relative to the scope.
    pub url: String,
    /// Treat as a top-level document load.
    pub navigate: bool,
    pub method: String,
}

/// Output from the fetch command.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutput {
    pub url: String,
    /// Set when the worker declined the request.
    pub passthrough: Option<PassthroughReason>,
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub bytes: Option<usize>,
    /// Body as text, when it is valid UTF-8.
    pub body: Option<String>,
}

/// Implementation of the fetch command.
pub async fn fetch_impl(ctx: &Context, params: &FetchParams) -> Result<FetchOutput, Error> {
    let worker = ctx.worker()?;
    worker.resume().await.map_err(|e| match e {
        Error::CacheMiss(name) => Error::InvalidState(format!("{name} is not installed; run `hubcache update` first")),
        other => other,
    })?;

    let scope = &worker.config().scope;
    let url = scope.resolve(&params.url)?;
    let method = Method::from_bytes(params.method.to_ascii_uppercase().as_bytes())
        .map_err(|e| Error::InvalidInput(format!("method {:?}: {e}", params.method)))?;
    let mode = if params.navigate {
        RequestMode::Navigate
    } else if scope.is_same_origin(&url) {
        RequestMode::SameOrigin
    } else {
        RequestMode::Cors
    };

    let outcome = worker.handle_fetch(&Request::new(method, url.clone(), mode)).await;
    let mut output = FetchOutput {
        url: url.to_string(),
        passthrough: None,
        source: None,
        status: None,
        content_type: None,
        bytes: None,
        body: None,
    };

    match outcome {
        FetchOutcome::Passthrough(reason) => output.passthrough = Some(reason),
        FetchOutcome::Respond { response, source } => {
            output.source = Some(source);
            output.status = Some(response.status.as_u16());
            output.content_type = response.content_type().map(str::to_string);
            output.bytes = Some(response.body.len());
            output.body = std::str::from_utf8(&response.body).ok().map(str::to_string);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::update::update_impl;
    use super::*;

    fn params(url: &str) -> FetchParams {
        FetchParams { url: url.into(), navigate: false, method: "GET".into() }
    }

    #[tokio::test]
    async fn test_fetch_requires_update() {
        let (ctx, _site) = context(config("v1", &["./index.html"])).await;
        let err = fetch_impl(&ctx, &params("./index.html")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(msg) if msg.contains("hub-v1")));
    }

    #[tokio::test]
    async fn test_fetch_served_from_cache() {
        let (ctx, _site) = context(config("v1", &["./index.html", "./offline.html"])).await;
        update_impl(&ctx).await.unwrap();

        let output = fetch_impl(&ctx, &params("index.html")).await.unwrap();
        assert_eq!(output.url, "https://hub.example/index.html");
        assert_eq!(output.source, Some(ResponseSource::Cache));
        assert_eq!(output.status, Some(200));
        assert_eq!(output.body.as_deref(), Some("./index.html"));
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation() {
        let (ctx, site) = context(config("v1", &["./index.html", "./offline.html"])).await;
        update_impl(&ctx).await.unwrap();
        site.set_offline(true);

        let nav = FetchParams { navigate: true, ..params("./calendar.html") };
        let output = fetch_impl(&ctx, &nav).await.unwrap();
        assert_eq!(output.source, Some(ResponseSource::OfflineFallback));
        assert_eq!(output.body.as_deref(), Some("./offline.html"));

        let output = fetch_impl(&ctx, &params("./calendar.js")).await.unwrap();
        assert_eq!(output.source, Some(ResponseSource::Failed));
        assert_eq!(output.status, Some(408));
        assert_eq!(output.bytes, Some(0));
    }

    #[tokio::test]
    async fn test_fetch_api_and_post_pass_through() {
        let (ctx, _site) = context(config("v1", &["./index.html"])).await;
        update_impl(&ctx).await.unwrap();

        let api = fetch_impl(&ctx, &params("https://auth.workers.dev/session")).await.unwrap();
        assert_eq!(api.passthrough, Some(PassthroughReason::ApiHost));

        let post = fetch_impl(&ctx, &FetchParams { method: "post".into(), ..params("./index.html") })
            .await
            .unwrap();
        assert_eq!(post.passthrough, Some(PassthroughReason::NonGetMethod));
        assert!(post.status.is_none());

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["passthrough"], "non_get_method");
    }

    #[tokio::test]
    async fn test_fetch_invalid_method() {
        let (ctx, _site) = context(config("v1", &["./index.html"])).await;
        update_impl(&ctx).await.unwrap();

        let bad = FetchParams { method: "BAD METHOD".into(), ..params("./index.html") };
        assert!(matches!(fetch_impl(&ctx, &bad).await, Err(Error::InvalidInput(_))));
    }
}
