use log::debug;
use serde::Deserialize;
use serde_json::json;

use crate::error::PipelineError;

// Controlled vocabulary offered to the model. Its answer is trusted as-is;
// membership is not re-checked on the way back.
const GENRES: &[&str] = &[
    "pop", "rock", "hip-hop", "rap", "edm", "classical", "jazz", "folk", "metal", "r&b",
    "country", "indie", "devotional", "lo-fi",
];
const MOODS: &[&str] = &[
    "happy", "sad", "energetic", "calm", "romantic", "dark", "uplifting", "nostalgic", "angry",
    "chill",
];
const OCCASIONS: &[&str] = &[
    "workout", "party", "study", "sleep", "driving", "wedding", "festival", "travel",
];
const ERAS: &[&str] = &["60s", "70s", "80s", "90s", "2000s", "2010s", "2020s"];
const VOCALS: &[&str] = &[
    "male vocals", "female vocals", "duet", "instrumental", "acoustic", "electronic",
];

/// Classifier-supplied metadata for one track, with the five category lists
/// already flattened into a single tag list.
#[derive(Debug, Clone)]
pub struct TrackTags {
    pub artist: String,
    pub language: String,
    pub tags: Vec<String>,
}

/// Client for the Gemini generateContent API.
#[derive(Debug, Clone)]
pub struct Classifier {
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// Shape the prompt asks the model to produce. Absent keys fall back to
// defaults rather than failing the request.
#[derive(Debug, Deserialize)]
struct RawTags {
    artist: Option<String>,
    language: Option<String>,
    #[serde(default)]
    genre: Vec<String>,
    #[serde(default)]
    mood: Vec<String>,
    #[serde(default)]
    occasion: Vec<String>,
    #[serde(default)]
    era: Vec<String>,
    #[serde(default)]
    vocal: Vec<String>,
}

impl Classifier {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Classifier {
            base_url,
            api_key,
            model,
        }
    }

    /// Ask the model to tag a track by title. One attempt; an answer that is
    /// not the requested JSON shape fails the whole request.
    pub async fn classify(
        &self,
        client: &reqwest::Client,
        title: &str,
    ) -> Result<TrackTags, PipelineError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("Classifying {title:?} with model {}", self.model);

        let body = json!({
            "contents": [
                {
                    "parts": [
                        { "text": build_prompt(title) }
                    ]
                }
            ]
        });

        let resp = client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                "classifier",
                format!("status {status}: {body}"),
            ));
        }

        let answer: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::upstream("classifier", e.to_string()))?;

        let text = answer
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                PipelineError::ClassifierParse("response contains no candidate text".to_string())
            })?;

        parse_tag_response(&text)
    }
}

fn build_prompt(title: &str) -> String {
    format!(
        "You are a music metadata classifier. Given the track title \"{title}\", \
         answer with a single JSON object and nothing else, using exactly these keys: \
         \"artist\" (string, the performing artist if you recognize it), \
         \"language\" (string, the language of the lyrics), \
         \"genre\", \"mood\", \"occasion\", \"era\", \"vocal\" (each an array of strings). \
         Pick array values only from these lists:\n\
         genre: {genres}\n\
         mood: {moods}\n\
         occasion: {occasions}\n\
         era: {eras}\n\
         vocal: {vocals}",
        genres = GENRES.join(", "),
        moods = MOODS.join(", "),
        occasions = OCCASIONS.join(", "),
        eras = ERAS.join(", "),
        vocals = VOCALS.join(", "),
    )
}

/// Strip an optional Markdown code fence from a model answer.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn parse_tag_response(text: &str) -> Result<TrackTags, PipelineError> {
    let raw: RawTags = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| PipelineError::ClassifierParse(e.to_string()))?;

    let mut tags = Vec::new();
    tags.extend(raw.genre);
    tags.extend(raw.mood);
    tags.extend(raw.occasion);
    tags.extend(raw.era);
    tags.extend(raw.vocal);

    Ok(TrackTags {
        artist: raw
            .artist
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        language: raw
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| "english".to_string()),
        tags,
    })
}
