pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod resolver;
pub mod server;
pub mod storage;

/// Extract video ID from a YouTube URL
///
/// Only the short-link and canonical watch-URL forms are accepted; anything
/// else is rejected so the caller can refuse the request up front.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // youtu.be/ID
    if let Some(caps) = regex::Regex::new(r"youtu\.be/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtube.com/watch?v=ID
    if let Some(caps) = regex::Regex::new(r"(?:youtube\.com/watch\?.*v=)([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    None
}

/// Sanitize a resolved track title for use as a storage filename.
///
/// Path separators always become dashes. In strict mode every character
/// outside a conservative allow-list is replaced too.
pub fn sanitize_title(title: &str, strict: bool) -> String {
    let replaced = title.replace(['/', '\\'], "-");
    let trimmed = replaced.trim();

    if !strict {
        return trimmed.to_string();
    }

    trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || " ._()&'-".contains(c) {
                c
            } else {
                '-'
            }
        })
        .collect()
}
