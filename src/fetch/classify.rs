//! Request classification: which partition and strategy a request gets.

use reqwest::Method;

use crate::config::Config;

use super::request::{FetchMode, FetchRequest};

/// App-shell formats served cache-first from the static partition.
const STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "html", "ico", "png", "jpg", "jpeg", "gif", "svg", "woff", "woff2", "ttf", "eot",
];

/// Image formats routed to the image partition.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "avif"];

/// Loopback hosts always allowed during development, regardless of the
/// configured origin.
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]", "::1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    StaticAsset,
    Image,
    Api,
    Navigation,
    Default,
}

/// First match wins: static extension, image extension, API prefix,
/// navigation, default. The static check runs first, but image formats
/// resolve to the image partition even when they also match the static
/// list; that precedence is intentional and load-bearing for which
/// partition bounds the entry.
pub fn classify(request: &FetchRequest, config: &Config) -> RequestClass {
    let path = request.url.path();

    if matches_extension(path, STATIC_EXTENSIONS) {
        if matches_extension(path, IMAGE_EXTENSIONS) {
            return RequestClass::Image;
        }
        return RequestClass::StaticAsset;
    }

    if matches_extension(path, IMAGE_EXTENSIONS) {
        return RequestClass::Image;
    }

    if config
        .api_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
    {
        return RequestClass::Api;
    }

    if is_navigation(request) {
        return RequestClass::Navigation;
    }

    RequestClass::Default
}

/// Top-level navigations, or plain GETs that declare an HTML-accepting
/// Accept header.
pub fn is_navigation(request: &FetchRequest) -> bool {
    if request.mode == FetchMode::Navigate {
        return true;
    }
    request.method == Method::GET
        && request
            .header("accept")
            .is_some_and(|accept| accept.contains("text/html"))
}

/// Only same-origin GETs are intercepted; everything else passes through
/// untouched and is never cached. Loopback origins are allowed so local
/// development traffic still flows through the cache.
pub fn should_intercept(request: &FetchRequest, config: &Config) -> bool {
    if request.method != Method::GET {
        return false;
    }

    let host = match request.url.host_str() {
        Some(host) => host,
        None => return false,
    };

    if LOOPBACK_HOSTS.contains(&host) {
        return true;
    }

    match config.origin.parse::<reqwest::Url>() {
        Ok(origin) => {
            origin.scheme() == request.url.scheme()
                && origin.host_str() == Some(host)
                && origin.port_or_known_default() == request.url.port_or_known_default()
        }
        Err(_) => false,
    }
}

fn matches_extension(path: &str, extensions: &[&str]) -> bool {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((_, ext)) => extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)),
        None => false,
    }
}
