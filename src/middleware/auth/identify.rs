//! Identification stage: pull a raw identifier out of the request into context.
//!
//! 抽出に失敗しても拒否はしない。リクエストはそのまま次へ流し、401 は
//! Authentication stage の責務とする。

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};

use crate::context::RequestContext;

#[derive(Debug, Clone)]
pub enum IdentifyBy {
    /// Header value taken verbatim. Empty or non-UTF-8 counts as absent.
    Header(HeaderName),
    /// Host portion of the peer address. Simplified; proxies are not considered.
    PeerAddress,
}

// Only this module can construct it, so downstream stages can read but not overwrite.
#[derive(Debug, Clone)]
struct Identifier(String);

/// The identifier extracted for this request, if any.
pub fn identifier(ctx: &RequestContext) -> Option<&str> {
    ctx.get::<Identifier>().map(|id| id.0.as_str())
}

pub async fn identify(State(by): State<IdentifyBy>, mut req: Request, next: Next) -> Response {
    if let Some(id) = extract(&by, &req) {
        req.extensions_mut().insert(Identifier(id));
    }

    next.run(req).await
}

fn extract(by: &IdentifyBy, req: &Request) -> Option<String> {
    match by {
        IdentifyBy::Header(name) => req
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        IdentifyBy::PeerAddress => req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::header, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    // Echo what the identification stage stored, or "-" when nothing was stored.
    async fn echo(req: Request) -> String {
        identifier(req.extensions()).unwrap_or("-").to_string()
    }

    fn app(by: IdentifyBy) -> Router {
        Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn_with_state(by, identify))
    }

    async fn body(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn header_is_read_verbatim() {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, "abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        let res = app(IdentifyBy::Header(header::AUTHORIZATION))
            .oneshot(req)
            .await
            .unwrap();

        assert_eq!(body(res).await, "abc.def.ghi");
    }

    #[tokio::test]
    async fn missing_or_empty_header_passes_through() {
        for req in [
            Request::builder().uri("/").body(Body::empty()).unwrap(),
            Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, "")
                .body(Body::empty())
                .unwrap(),
        ] {
            let res = app(IdentifyBy::Header(header::AUTHORIZATION))
                .oneshot(req)
                .await
                .unwrap();
            assert!(res.status().is_success());
            assert_eq!(body(res).await, "-");
        }
    }

    #[tokio::test]
    async fn peer_address_takes_host_portion() {
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 54321))));

        let res = app(IdentifyBy::PeerAddress).oneshot(req).await.unwrap();
        assert_eq!(body(res).await, "192.0.2.1");
    }

    #[tokio::test]
    async fn unknown_peer_passes_through() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = app(IdentifyBy::PeerAddress).oneshot(req).await.unwrap();
        assert_eq!(body(res).await, "-");
    }
}
