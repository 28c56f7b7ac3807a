//! Responses that the browser saves as a file.

use axum::{
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 5987 `attr-char`: everything else is percent-encoded
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Build a `Content-Disposition: attachment` response.
///
/// Extra headers whose values are not valid header text are skipped.
pub fn attachment(
    bytes: Vec<u8>,
    content_type: &str,
    file_name: &str,
    extra: &[(&'static str, String)],
) -> Response {
    let mut response = (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(file_name)),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        bytes,
    )
        .into_response();

    let headers = response.headers_mut();
    for (name, value) in extra {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    response
}

/// `attachment; filename="..."` with the name reduced to safe ASCII.
///
/// When that loses characters, the exact name follows as an RFC 6266
/// `filename*=UTF-8''...` parameter.
pub fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    if safe == file_name {
        format!("attachment; filename=\"{safe}\"")
    } else {
        let encoded = utf8_percent_encode(file_name, ATTR_CHAR);
        format!("attachment; filename=\"{safe}\"; filename*=UTF-8''{encoded}")
    }
}
