//! Cookie-carrying HTTP client over an in-process router.

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, HOST, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request};
use axum::Router;
use cookie::Cookie;
use serde_json::Value;
use storyboard_core::server::auth::SESSION_COOKIE;
use storyboard_core::server::middleware::CSRF_FIELD;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Rendered page as `{"template": .., "data": {..}}`
    pub fn page(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body is a rendered page")
    }

    pub fn template(&self) -> String {
        self.page()["template"].as_str().unwrap_or_default().to_string()
    }

    /// Flash messages delivered with this page
    pub fn flashes(&self) -> Vec<String> {
        self.page()["data"]["flashes"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Sends requests as a browser would: same host, session cookie carried
/// over, and the anti-forgery token from the last rendered page echoed in
/// every form
pub struct TestClient {
    app: Router,
    host: String,
    session_cookie: Option<String>,
    csrf_token: Option<String>,
    forwarded_proto: Option<String>,
}

impl TestClient {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            host: "localhost:4000".to_string(),
            session_cookie: None,
            csrf_token: None,
            forwarded_proto: None,
        }
    }

    /// Pretend to be a remote client behind the TLS proxy
    pub fn with_host(mut self, host: &str, forwarded_proto: Option<&str>) -> Self {
        self.host = host.to_string();
        self.forwarded_proto = forwarded_proto.map(str::to_string);
        self
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// Send `cookie` (a `name=value` pair) from now on
    pub fn set_session_cookie(&mut self, cookie: &str) {
        self.session_cookie = Some(cookie.to_string());
        self.csrf_token = None;
    }

    pub fn clear_cookies(&mut self) {
        self.session_cookie = None;
        self.csrf_token = None;
    }

    /// Token of the last rendered page
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, Body::empty(), None).await
    }

    /// Submit a form the way a page would, with the session's token.
    /// Loads the login page first when no page has been seen yet.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        if self.csrf_token.is_none() {
            self.get("/login").await;
        }
        let token = self.csrf_token.clone().expect("login page carries a csrf token");

        let mut fields = fields.to_vec();
        fields.push((CSRF_FIELD, token.as_str()));
        self.post_form_raw(uri, &fields).await
    }

    /// Submit exactly `fields`, with no token added
    pub async fn post_form_raw(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).expect("form fields encode");
        self.send(
            Method::POST,
            uri,
            Body::from(body),
            Some("application/x-www-form-urlencoded"),
        )
        .await
    }

    async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(HOST, &self.host);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(proto) = &self.forwarded_proto {
            builder = builder.header("x-forwarded-proto", proto);
        }
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = builder.body(body).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        for set_cookie in headers.get_all(SET_COOKIE) {
            let cookie = Cookie::parse(set_cookie.to_str().unwrap()).unwrap();
            if cookie.name() == SESSION_COOKIE {
                self.session_cookie = Some(cookie.stripped().to_string());
            }
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        if let Some(token) = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|page| page["data"][CSRF_FIELD].as_str().map(str::to_string))
        {
            self.csrf_token = Some(token);
        }

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
