//! Auth cookie parsing and `Set-Cookie` construction.

use std::collections::HashMap;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Parse every `Cookie` header into a map of name to value.
///
/// Later occurrences of a name win.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                map.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }
    map
}

/// Value of a single cookie, if present and non-empty.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    parse_cookies(headers).remove(name).filter(|v| !v.is_empty())
}

/// An httponly cookie valid for `max_age_secs`.
pub fn auth_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// A cookie that makes the browser drop `name` immediately.
pub fn expired_cookie(name: &str, secure: bool) -> String {
    auth_cookie(name, "", 0, secure)
}
