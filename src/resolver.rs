use log::debug;
use serde::Deserialize;

use crate::error::PipelineError;

/// Direct download URL and display title for a resolved video.
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    pub download_url: String,
    pub title: String,
}

/// Client for the RapidAPI video-to-mp3 lookup service.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_url: String,
    api_key: String,
    api_host: String,
}

#[derive(Debug, Deserialize)]
struct DlResponse {
    link: Option<String>,
    title: Option<String>,
}

impl Resolver {
    pub fn new(base_url: String, api_key: String, api_host: String) -> Self {
        Resolver {
            base_url,
            api_key,
            api_host,
        }
    }

    /// Look up the direct mp3 URL and title for a video ID. One attempt, no
    /// retry; a missing link in an otherwise fine response is its own error.
    pub async fn resolve(
        &self,
        client: &reqwest::Client,
        video_id: &str,
    ) -> Result<ResolvedTrack, PipelineError> {
        let url = format!("{}/dl", self.base_url);
        debug!("Resolving video {video_id} via {url}");

        let resp = client
            .get(&url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .query(&[("id", video_id)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                "resolver",
                format!("status {status}: {body}"),
            ));
        }

        let dl: DlResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::upstream("resolver", e.to_string()))?;

        let download_url = match dl.link {
            Some(link) if !link.is_empty() => link,
            _ => return Err(PipelineError::NoDownloadLink(video_id.to_string())),
        };

        let title = dl
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "downloaded_song".to_string());

        Ok(ResolvedTrack { download_url, title })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/dl")
            .match_query(mockito::Matcher::UrlEncoded("id".into(), "abc123".into()))
            .match_header("x-rapidapi-key", "k")
            .match_header("x-rapidapi-host", "h.example.com")
            .with_status(200)
            .with_body(r#"{"link": "https://x/y.mp3", "title": "My Song"}"#)
            .create_async()
            .await;

        let resolver = Resolver::new(server.url(), "k".to_string(), "h.example.com".to_string());
        let client = reqwest::Client::new();
        let resolved = resolver.resolve(&client, "abc123").await.unwrap();

        assert_eq!(resolved.download_url, "https://x/y.mp3");
        assert_eq!(resolved.title, "My Song");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_missing_link() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/dl")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"title": "My Song"}"#)
            .create_async()
            .await;

        let resolver = Resolver::new(server.url(), "k".to_string(), "h".to_string());
        let client = reqwest::Client::new();
        let err = resolver.resolve(&client, "abc123").await.unwrap_err();

        assert!(matches!(err, PipelineError::NoDownloadLink(ref id) if id == "abc123"));
    }

    #[tokio::test]
    async fn test_resolve_missing_title_defaults() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/dl")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"link": "https://x/y.mp3"}"#)
            .create_async()
            .await;

        let resolver = Resolver::new(server.url(), "k".to_string(), "h".to_string());
        let client = reqwest::Client::new();
        let resolved = resolver.resolve(&client, "abc123").await.unwrap();

        assert_eq!(resolved.title, "downloaded_song");
    }

    #[tokio::test]
    async fn test_resolve_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/dl")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let resolver = Resolver::new(server.url(), "k".to_string(), "h".to_string());
        let client = reqwest::Client::new();
        let err = resolver.resolve(&client, "abc123").await.unwrap_err();

        assert!(matches!(err, PipelineError::Upstream { service: "resolver", .. }));
    }

    #[tokio::test]
    async fn test_resolve_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/dl")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let resolver = Resolver::new(server.url(), "k".to_string(), "h".to_string());
        let client = reqwest::Client::new();
        let err = resolver.resolve(&client, "abc123").await.unwrap_err();

        assert!(matches!(err, PipelineError::Upstream { service: "resolver", .. }));
    }
}
