//! Authenticated CalDAV HTTP client.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Client, Method, Response, StatusCode, Url};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

const XML: &str = "application/xml; charset=utf-8";
const ICS: &str = "text/calendar; charset=utf-8";

fn dav_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.as_bytes()).with_context(|| format!("Invalid HTTP method {name}"))
}

/// HTTP client with basic auth that survives cross-host redirects.
///
/// iCloud answers on `caldav.icloud.com` and redirects to a per-user host;
/// reqwest drops credentials on such redirects, so they are followed here.
#[derive(Clone)]
pub struct CalDavClient {
    http: Client,
    username: String,
    password: String,
}

impl CalDavClient {
    pub fn new(username: &str, password: &str) -> Result<Self> {
        let http = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(CalDavClient {
            http,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    async fn send(&self, method: Method, url: &Url, headers: HeaderMap, body: Option<String>) -> Result<Response> {
        let mut url = url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .basic_auth(&self.username, Some(&self.password))
                .headers(headers.clone());
            if let Some(body) = &body {
                request = request.body(body.clone());
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("{method} {url} failed"))?;

            if !response.status().is_redirection() {
                debug!("{method} {url} => {}", response.status());
                return Ok(response);
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .with_context(|| format!("{method} {url} redirected without a Location"))?;
            url = url
                .join(location)
                .with_context(|| format!("Invalid redirect target {location}"))?;
            debug!("{method} redirected to {url}");
        }

        bail!("Too many redirects for {method} {url}")
    }

    /// PROPFIND `url`. Returns the multistatus body and the URL that answered,
    /// which relative hrefs in the body resolve against.
    pub async fn propfind(&self, url: &Url, depth: u8, body: &str) -> Result<(Url, String)> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML));
        headers.insert(HeaderName::from_static("depth"), HeaderValue::from(u16::from(depth)));

        let response = self
            .send(dav_method("PROPFIND")?, url, headers, Some(body.to_string()))
            .await?;
        let answered = response.url().clone();
        let body = read_success(response, "PROPFIND").await?;
        Ok((answered, body))
    }

    pub async fn report(&self, url: &Url, body: String) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML));
        headers.insert(HeaderName::from_static("depth"), HeaderValue::from_static("1"));

        let response = self.send(dav_method("REPORT")?, url, headers, Some(body)).await?;
        read_success(response, "REPORT").await
    }

    /// PUT an ICS object. With `create_only`, the server must not overwrite an
    /// existing resource; the raw status is returned so callers can treat 412
    /// as "already there".
    pub async fn put_ics(&self, url: &Url, ics: String, create_only: bool) -> Result<(StatusCode, String)> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ICS));
        if create_only {
            headers.insert(reqwest::header::IF_NONE_MATCH, HeaderValue::from_static("*"));
        }

        let response = self.send(Method::PUT, url, headers, Some(ics)).await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Ok((status, text))
    }

    pub async fn delete(&self, url: &Url) -> Result<StatusCode> {
        let response = self.send(Method::DELETE, url, HeaderMap::new(), None).await?;
        Ok(response.status())
    }

    pub async fn mkcalendar(&self, url: &Url, body: String) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML));

        let response = self.send(dav_method("MKCALENDAR")?, url, headers, Some(body)).await?;
        read_success(response, "MKCALENDAR").await.map(|_| ())
    }
}

async fn read_success(response: Response, what: &str) -> Result<String> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await.context("Failed to read response body")?;

    if !status.is_success() {
        bail!("{what} {url} failed (status {status}): {body}");
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redirect_keeps_credentials() {
        let mut server = mockito::Server::new_async().await;
        let redirect = server
            .mock("PROPFIND", "/")
            .with_status(301)
            .with_header("location", "/p01/")
            .create_async()
            .await;
        let target = server
            .mock("PROPFIND", "/p01/")
            .match_header("authorization", "Basic bWU6c2VjcmV0")
            .match_header("depth", "0")
            .with_status(207)
            .with_body("<multistatus xmlns=\"DAV:\"/>")
            .create_async()
            .await;

        let client = CalDavClient::new("me", "secret").unwrap();
        let base = Url::parse(&server.url()).unwrap();
        let (answered, body) = client.propfind(&base, 0, "<propfind/>").await.unwrap();

        assert_eq!(answered.path(), "/p01/");
        assert!(body.contains("multistatus"));
        redirect.assert_async().await;
        target.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_propfind_is_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("PROPFIND", "/").with_status(401).create_async().await;

        let client = CalDavClient::new("me", "wrong").unwrap();
        let base = Url::parse(&server.url()).unwrap();
        let err = client.propfind(&base, 0, "<propfind/>").await.unwrap_err();

        assert!(err.to_string().contains("401"), "{err}");
    }
}
