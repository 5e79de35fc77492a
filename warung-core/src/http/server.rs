//! Edge HTTP server
//!
//! [`handle`] runs the whole per-request pipeline against a
//! [`WarungState`]; [`serve`] is the hyper accept loop around it.

use bytes::Bytes;
use http::header::CACHE_CONTROL;
use http::{Method, Request, StatusCode};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::render::{robots_txt, Page};
use super::request::RequestInfo;
use super::response::{self, EdgeResponse};
use crate::indexing::key_for;
use crate::security::Verdict;
use crate::state::WarungState;

const ROBOTS_MAX_AGE_SECS: u64 = 86_400;
const KEY_FILE_MAX_AGE_SECS: u64 = 3_600;

/// Run one request through resolution, screening, routing, rendering and
/// cloaking. CORS preflights are answered only after screening passes.
pub async fn handle(state: &WarungState, req: RequestInfo) -> EdgeResponse {
    let site = state.resolve_site(req.host.as_deref());

    let rest = site.strip_base_path(&req.path);
    if state.pinger().is_key_file(&format!("/{}", rest), &site.domain) {
        return response::cacheable_text(key_for(&site.domain), KEY_FILE_MAX_AGE_SECS);
    }

    let screening = state.gate().screen(&req, &site);
    match &screening.verdict {
        Verdict::Pass => {}
        Verdict::Passthrough => return response::static_passthrough(),
        Verdict::Honeypot | Verdict::Silenced => return response::text(StatusCode::OK, Bytes::new()),
        Verdict::Blackhole(decoy) | Verdict::FakeLanding(decoy) => {
            let mut resp = response::html(StatusCode::OK, decoy.clone());
            response::set_header(&mut resp, CACHE_CONTROL, "no-store");
            return resp;
        }
        Verdict::Redirect(location) => return response::redirect(location),
        Verdict::Throttled(throttled) => return response::throttled(throttled),
    }

    if req.method == Method::OPTIONS {
        return response::cors_preflight(&site.domain);
    }

    if rest == "robots.txt" {
        let body = robots_txt(&site.domain, state.gate().honeypot_prefix());
        return response::cacheable_text(body, ROBOTS_MAX_AGE_SECS);
    }

    state.pinger().maybe_schedule(&site.domain, state.catalog());

    let client = state.client(site.clone()).with_tag(req.tag());
    let effective = client.effective_config().await;
    let page = Page::route(&req, &effective, state.catalog());
    match &page {
        Page::Landing { keyword } => {
            state.pinger().ping_on_keyword_hit(&site.domain, state.catalog(), keyword);
        }
        Page::Feed { name } if name == "sitemap.xml" && screening.crawler => {
            state.pinger().ping_on_sitemap(client.clone(), state.catalog());
        }
        _ => {}
    }

    let rendered = state.renderer().render(&page, &client, &effective).await;
    let body = state.gate().finish(&screening, rendered.content_type, rendered.body, &site, &req.path);

    let elapsed = state.clock().now_millis().saturating_sub(req.started_at_ms);
    log::debug!(
        "[{}] {} {} -> {} in {}ms",
        req.request_id,
        req.method,
        req.path,
        rendered.status.as_u16(),
        elapsed
    );
    response::respond(rendered.status, rendered.content_type, body)
}

async fn handle_hyper(
    state: Arc<WarungState>,
    req: Request<Incoming>,
    remote: SocketAddr,
) -> Result<EdgeResponse, Infallible> {
    let (parts, _body) = req.into_parts();
    let info = RequestInfo::from_parts(
        &parts,
        &state.config().server.client_ip_header,
        Some(remote),
        state.clock().now_millis(),
    );
    Ok(handle(&state, info).await)
}

/// Accept connections until `shutdown` resolves, then drain background work
pub async fn serve<S>(state: Arc<WarungState>, shutdown: S) -> anyhow::Result<()>
where
    S: Future<Output = ()>,
{
    let addr = state.config().server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    log::info!("warung edge listening on {}", addr);

    tokio::pin!(shutdown);
    loop {
        let (stream, remote) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    log::warn!("accept failed: {}", err);
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        let io = TokioIo::new(stream);
        let state = state.clone();
        tokio::task::spawn(async move {
            let service = service_fn(move |req| handle_hyper(state.clone(), req, remote));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                log::debug!("connection from {} closed with error: {}", remote, err);
            }
        });
    }

    log::info!("shutting down, waiting for background tasks");
    state.shutdown().await;
    Ok(())
}
