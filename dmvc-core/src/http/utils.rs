//! HTTP utility functions for the hyper server

use crate::query::QueryParams;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;

/// Common HTTP type aliases
pub type RespBody = BoxBody<Bytes, Infallible>;
pub type Req = Request<hyper::body::Incoming>;
pub type Resp = Response<RespBody>;

/// Create a response body from any data that can be converted to Bytes
pub fn body_from<T: Into<Bytes>>(data: T) -> RespBody {
    Full::new(data.into()).boxed()
}

/// JSON error response with `{"error", "message"}` body
pub fn json_error_response(status: StatusCode, error: &str, message: &str) -> Resp {
    let body = serde_json::json!({ "error": error, "message": message });
    let mut resp = Response::new(body_from(body.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    resp
}

/// Decode a query string; `+` is a space and the first value of a repeated key wins
pub fn parse_query(query: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        if key.is_empty() {
            continue;
        }
        params.entry(key).or_insert_with(|| decode_component(value));
    }
    params
}

/// Percent-decode one query component, keeping the raw text if it is not valid UTF-8
pub fn decode_component(raw: &str) -> String {
    decode_path_segment(&raw.replace('+', " "))
}

/// Percent-decode a path segment; `+` stays literal
pub fn decode_path_segment(raw: &str) -> String {
    urlencoding::decode(raw).map(|s| s.into_owned()).unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let params = parse_query("limit=2&sort=name&limit=5&q=hello+world&flag&=x&name=%C3%A9");
        assert_eq!(params["limit"], "2");
        assert_eq!(params["sort"], "name");
        assert_eq!(params["q"], "hello world");
        assert_eq!(params["flag"], "");
        assert_eq!(params["name"], "é");
        assert!(!params.contains_key(""));
    }

    #[test]
    fn test_path_segment_keeps_plus() {
        assert_eq!(decode_path_segment("a+b%2Fc"), "a+b/c");
    }

    #[test]
    fn test_json_error_response() {
        let resp = json_error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "too big");
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(resp.headers()[hyper::header::CONTENT_TYPE], "application/json");
    }
}
