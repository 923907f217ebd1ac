use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::header::{CONTENT_TYPE, HeaderValue, ORIGIN, REFERER};
use reqwest::{Client, Url};
use shiftsync_core::YearMonth;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Logged-in session on the portal. The session lives in the cookie jar.
pub struct ShiftWebClient {
    http: Client,
    base: Url,
}

impl ShiftWebClient {
    /// Open a session for staff member `id`.
    ///
    /// The login page has to be fetched first so the server hands out the
    /// session cookie that the login call then authenticates.
    pub async fn login(base_url: &str, id: &str, password: &str) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("Invalid ShiftWeb URL: {base_url}"))?;
        let http = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let client = ShiftWebClient { http, base };
        client.authenticate(id, password).await?;
        Ok(client)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Invalid ShiftWeb path: {path}"))
    }

    fn origin(&self) -> String {
        self.base.origin().ascii_serialization()
    }

    async fn authenticate(&self, id: &str, password: &str) -> Result<()> {
        let login_page = self.endpoint("/login.php?err=1")?;
        self.http
            .get(login_page.clone())
            .send()
            .await
            .context("Failed to load the login page")?;

        let mut check = self.endpoint("/cont/login/check_login.php")?;
        check.set_query(Some(id));

        let response = self
            .http
            .post(check)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
            )
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ORIGIN, self.origin())
            .header(REFERER, login_page.as_str())
            .form(&[("id", id), ("password", password), ("savelogin", "1")])
            .send()
            .await
            .context("Login request failed")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() || status.is_server_error() {
            bail!("Login rejected (status {status}): {body}");
        }

        debug!(%status, "logged in to ShiftWeb");
        Ok(())
    }

    /// Raw HTML of the shift table for `month`.
    pub async fn month_page(&self, month: YearMonth) -> Result<String> {
        let referer = self.endpoint("/shift.php")?;
        let mut url = referer.clone();
        url.query_pairs_mut()
            .append_pair("mod", "look")
            .append_pair("date2", &month.to_string());

        let response = self
            .http
            .get(url)
            .header(REFERER, referer.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to fetch shifts for {month}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read shifts for {month}"))?;
        if status.is_client_error() || status.is_server_error() {
            bail!("Shift page for {month} returned status {status}");
        }

        debug!(%month, %status, bytes = body.len(), "fetched shift page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_login_keeps_session_cookie() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/login.php")
            .match_query(Matcher::UrlEncoded("err".into(), "1".into()))
            .with_header("set-cookie", "PHPSESSID=abc; Path=/")
            .with_body("<html></html>")
            .create_async()
            .await;
        let check = server
            .mock("POST", "/cont/login/check_login.php")
            .match_query(Matcher::Exact("12345".into()))
            .match_header("cookie", Matcher::Regex("PHPSESSID=abc".into()))
            .match_header("x-requested-with", "XMLHttpRequest")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "12345".into()),
                Matcher::UrlEncoded("password".into(), "hunter2".into()),
                Matcher::UrlEncoded("savelogin".into(), "1".into()),
            ]))
            .with_body("ok")
            .create_async()
            .await;
        let page = server
            .mock("GET", "/shift.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("mod".into(), "look".into()),
                Matcher::UrlEncoded("date2".into(), "2025-11".into()),
            ]))
            .match_header("cookie", Matcher::Regex("PHPSESSID=abc".into()))
            .with_body("<table id=\"shiftTable\"></table>")
            .create_async()
            .await;

        let client = ShiftWebClient::login(&server.url(), "12345", "hunter2").await.unwrap();
        let html = client.month_page(YearMonth::new(2025, 11).unwrap()).await.unwrap();

        assert!(html.contains("shiftTable"));
        check.assert_async().await;
        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/login.php")
            .match_query(Matcher::Any)
            .create_async()
            .await;
        server
            .mock("POST", "/cont/login/check_login.php")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("bad password")
            .create_async()
            .await;

        let err = ShiftWebClient::login(&server.url(), "12345", "wrong")
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("403"));
    }
}
