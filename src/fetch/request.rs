//! Outbound request identity as seen by the dispatcher.

use reqwest::{Method, Url};

/// How the request was issued by the application. Top-level page
/// navigations carry `Navigate`; everything else is `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Navigate,
    Default,
}

/// An intercepted outbound request: method, URL, declared headers, and
/// navigation mode. Cache keys are derived from method + full URL, so two
/// requests for the same resource share one partition entry.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub mode: FetchMode,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            mode: FetchMode::Default,
        }
    }

    /// Plain GET for a resource.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Top-level page navigation to a URL.
    pub fn navigate(url: Url) -> Self {
        let mut request = Self::new(Method::GET, url);
        request.mode = FetchMode::Navigate;
        request
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Partition entry key for this request.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_method_and_url() {
        let url: Url = "http://localhost:5173/api/students".parse().unwrap();
        let request = FetchRequest::get(url);
        assert_eq!(request.cache_key(), "GET http://localhost:5173/api/students");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let url: Url = "http://localhost:5173/".parse().unwrap();
        let request = FetchRequest::get(url).with_header("Accept", "text/html");
        assert_eq!(request.header("accept"), Some("text/html"));
        assert!(request.header("authorization").is_none());
    }
}
