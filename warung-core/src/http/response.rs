//! Response builders for the edge server

use bytes::Bytes;
use http::header::{self, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::Full;

use crate::error::Throttled;

pub type EdgeBody = Full<Bytes>;
pub type EdgeResponse = Response<EdgeBody>;

pub const HTML: &str = "text/html; charset=UTF-8";
pub const TEXT: &str = "text/plain; charset=UTF-8";

/// Response with a status, a content type and a body
pub fn respond(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> EdgeResponse {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    set_header(&mut resp, header::CONTENT_TYPE, content_type);
    resp
}

/// Set a header; values that are not valid header text are skipped
pub fn set_header(resp: &mut EdgeResponse, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            resp.headers_mut().insert(name, value);
        }
        Err(_) => log::debug!("dropping invalid {} header value", name),
    }
}

pub fn html(status: StatusCode, body: String) -> EdgeResponse {
    respond(status, HTML, body)
}

pub fn text(status: StatusCode, body: impl Into<Bytes>) -> EdgeResponse {
    respond(status, TEXT, body)
}

/// Status with no body
pub fn empty(status: StatusCode) -> EdgeResponse {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

/// Answer for a static asset path. The hosting platform serves static files
/// before the edge runs, so one that reaches the edge does not exist.
pub fn static_passthrough() -> EdgeResponse {
    text(StatusCode::NOT_FOUND, "Not Found")
}

/// 429 with `Retry-After`
pub fn throttled(throttled: &Throttled) -> EdgeResponse {
    let secs = throttled.retry_after_secs;
    let mut resp = text(
        StatusCode::TOO_MANY_REQUESTS,
        format!("Too Many Requests - Coba lagi dalam {} detik.", secs),
    );
    set_header(&mut resp, header::RETRY_AFTER, &secs.to_string());
    resp
}

/// Temporary redirect that keeps the method
pub fn redirect(location: &str) -> EdgeResponse {
    let mut resp = empty(StatusCode::TEMPORARY_REDIRECT);
    set_header(&mut resp, header::LOCATION, location);
    set_header(&mut resp, header::CACHE_CONTROL, "no-store");
    resp
}

/// 204 answer to a CORS preflight from the site's own origin
pub fn cors_preflight(domain: &str) -> EdgeResponse {
    let mut resp = empty(StatusCode::NO_CONTENT);
    set_header(&mut resp, header::ACCESS_CONTROL_ALLOW_ORIGIN, &format!("https://{}", domain));
    set_header(&mut resp, header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS");
    set_header(&mut resp, header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type");
    set_header(&mut resp, header::ACCESS_CONTROL_MAX_AGE, "86400");
    resp
}

/// Plain text with a public cache lifetime
pub fn cacheable_text(body: String, max_age_secs: u64) -> EdgeResponse {
    let mut resp = text(StatusCode::OK, body);
    set_header(&mut resp, header::CACHE_CONTROL, &format!("public, max-age={}", max_age_secs));
    resp
}

/// Content type of a built response, empty when unset
pub fn content_type(resp: &EdgeResponse) -> &str {
    resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_carries_retry_after() {
        let resp = throttled(&Throttled { retry_after_secs: 17 });
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers()[header::RETRY_AFTER], "17");
        assert_eq!(content_type(&resp), TEXT);
    }

    #[test]
    fn redirect_is_temporary_and_uncached() {
        let resp = redirect("https://sacrifice-1.example.com/x");
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers()[header::LOCATION], "https://sacrifice-1.example.com/x");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[test]
    fn preflight_allows_only_the_site_origin() {
        let resp = cors_preflight("example.com");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[test]
    fn static_passthrough_is_a_plain_404() {
        let resp = static_passthrough();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(content_type(&resp), TEXT);
    }

    #[test]
    fn invalid_header_values_are_skipped() {
        let mut resp = empty(StatusCode::OK);
        set_header(&mut resp, header::LOCATION, "bad\nvalue");
        assert!(resp.headers().get(header::LOCATION).is_none());
    }
}
