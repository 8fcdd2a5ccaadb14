use bytes::Bytes;
use log::debug;
use reqwest::header::CONTENT_TYPE;

use crate::error::PipelineError;

/// Thumbnail quality tiers, tried in order; the first hit wins.
const THUMBNAIL_TIERS: [&str; 5] = [
    "maxresdefault",
    "sddefault",
    "hqdefault",
    "mqdefault",
    "default",
];

/// Download the resolved audio URL fully into memory.
///
/// The payload is accepted when the declared content type is audio-ish or the
/// leading bytes carry an MP3 signature; otherwise it is rejected outright.
pub async fn fetch_audio(client: &reqwest::Client, url: &str) -> Result<Bytes, PipelineError> {
    debug!("Downloading audio: {url}");

    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(PipelineError::upstream(
            "audio download",
            format!("status {}", resp.status()),
        ));
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    let declared_audio =
        content_type.starts_with("audio/") || content_type.starts_with("application/octet-stream");

    let bytes = resp.bytes().await?;
    debug!("Audio payload: {} bytes, content-type {content_type:?}", bytes.len());

    if !declared_audio && !looks_like_mp3(&bytes) {
        return Err(PipelineError::ContentValidation(format!(
            "content type {content_type:?} is not audio and payload has no MP3 signature"
        )));
    }

    Ok(bytes)
}

fn looks_like_mp3(bytes: &[u8]) -> bool {
    if bytes.starts_with(b"ID3") {
        return true;
    }
    infer::get(bytes)
        .map(|kind| kind.mime_type() == "audio/mpeg")
        .unwrap_or(false)
}

/// Fetch the best available thumbnail for a video, walking the quality tiers
/// from highest to lowest. Returns the image bytes and a storage filename.
pub async fn fetch_thumbnail(
    client: &reqwest::Client,
    base_url: &str,
    video_id: &str,
) -> Result<(Bytes, String), PipelineError> {
    for tier in THUMBNAIL_TIERS {
        let url = format!("{base_url}/vi/{video_id}/{tier}.jpg");
        debug!("Trying thumbnail tier: {url}");

        let resp = match client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("Thumbnail tier {tier} failed: {e}");
                continue;
            }
        };

        if resp.status().is_success() {
            let bytes = resp.bytes().await?;
            debug!("Thumbnail tier {tier} hit: {} bytes", bytes.len());
            return Ok((bytes, format!("{video_id}.jpg")));
        }
    }

    Err(PipelineError::upstream(
        "thumbnail download",
        format!("no thumbnail found for video {video_id}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal MPEG frame header: sync bits plus MPEG-1 Layer III flags
    const MP3_FRAME: [u8; 4] = [0xff, 0xfb, 0x90, 0x00];

    #[test]
    fn test_id3_signature_accepted() {
        assert!(looks_like_mp3(b"ID3\x04\x00\x00\x00\x00\x00\x00"));
    }

    #[test]
    fn test_frame_sync_accepted() {
        let mut payload = MP3_FRAME.to_vec();
        payload.extend_from_slice(&[0u8; 64]);
        assert!(looks_like_mp3(&payload));
    }

    #[test]
    fn test_html_rejected() {
        assert!(!looks_like_mp3(b"<html><body>blocked</body></html>"));
    }

    #[tokio::test]
    async fn test_fetch_audio_declared_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/y.mp3")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body("pretend-mp3-bytes")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let bytes = fetch_audio(&client, &format!("{}/y.mp3", server.url()))
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"pretend-mp3-bytes");
    }

    #[tokio::test]
    async fn test_fetch_audio_signature_overrides_type() {
        let mut server = mockito::Server::new_async().await;
        let mut body = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
        body.extend_from_slice(&[0u8; 32]);
        server
            .mock("GET", "/y.mp3")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body(body)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        assert!(fetch_audio(&client, &format!("{}/y.mp3", server.url())).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_audio_rejects_non_audio() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/y.mp3")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>nope</html>")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let err = fetch_audio(&client, &format!("{}/y.mp3", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ContentValidation(_)));
    }

    #[tokio::test]
    async fn test_fetch_audio_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/y.mp3")
            .with_status(404)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let err = fetch_audio(&client, &format!("{}/y.mp3", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Upstream { service: "audio download", .. }));
    }

    #[tokio::test]
    async fn test_thumbnail_third_tier_wins() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/vi/abc123/maxresdefault.jpg")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/vi/abc123/sddefault.jpg")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/vi/abc123/hqdefault.jpg")
            .with_status(200)
            .with_body("jpeg-bytes")
            .create_async()
            .await;
        let lower_tier = server
            .mock("GET", "/vi/abc123/mqdefault.jpg")
            .expect(0)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let (bytes, name) = fetch_thumbnail(&client, &server.url(), "abc123").await.unwrap();

        assert_eq!(&bytes[..], b"jpeg-bytes");
        assert_eq!(name, "abc123.jpg");
        lower_tier.assert_async().await;
    }

    #[tokio::test]
    async fn test_thumbnail_all_tiers_exhausted() {
        let mut server = mockito::Server::new_async().await;
        for tier in THUMBNAIL_TIERS {
            server
                .mock("GET", format!("/vi/abc123/{tier}.jpg").as_str())
                .with_status(404)
                .create_async()
                .await;
        }

        let client = reqwest::Client::new();
        let err = fetch_thumbnail(&client, &server.url(), "abc123").await.unwrap_err();
        assert!(matches!(err, PipelineError::Upstream { service: "thumbnail download", .. }));
    }
}
