use log::{info, warn};

use crate::classify::Classifier;
use crate::config::Config;
use crate::db::{TableStore, TrackRecord};
use crate::error::PipelineError;
use crate::resolver::Resolver;
use crate::storage::StorageClient;
use crate::{extract_video_id, fetch, sanitize_title};

/// Knobs that used to be separate pipeline revisions.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub songs_folder: String,
    pub images_folder: String,
    pub thumbnail_base: String,
    pub strict_sanitize: bool,
    pub public_links: bool,
    pub public_link_required: bool,
}

/// What a successful request hands back to the caller.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub file_id: u64,
    pub img_id: u64,
    pub name: String,
    pub artist: String,
    pub language: String,
    pub tags: Vec<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
}

/// The whole workflow: resolve, fetch, upload, classify, persist. Strictly
/// sequential, single attempt per step, first failure aborts the request.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub client: reqwest::Client,
    pub resolver: Resolver,
    pub storage: StorageClient,
    pub classifier: Classifier,
    pub store: TableStore,
    pub options: PipelineOptions,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Self {
        let settings = &config.settings;
        let credentials = &config.credentials;
        Pipeline {
            client: reqwest::Client::new(),
            resolver: Resolver::new(
                config.resolver_base(),
                credentials.rapidapi_key.clone(),
                credentials.rapidapi_host.clone(),
            ),
            storage: StorageClient::new(config.storage_base(), credentials.pcloud_auth.clone()),
            classifier: Classifier::new(
                config.classifier_base(),
                credentials.gemini_api_key.clone(),
                settings.gemini_model.clone(),
            ),
            store: TableStore::new(
                credentials.supabase_url.clone(),
                credentials.supabase_key.clone(),
                settings.db_table.clone(),
            ),
            options: PipelineOptions {
                songs_folder: settings.songs_folder.clone(),
                images_folder: settings.images_folder.clone(),
                thumbnail_base: config.thumbnail_base(),
                strict_sanitize: settings.strict_sanitize,
                public_links: settings.public_links,
                public_link_required: settings.public_link_required,
            },
        }
    }

    /// Run the full workflow for one submitted link.
    pub async fn process(&self, link: &str) -> Result<ProcessOutcome, PipelineError> {
        let video_id = extract_video_id(link)
            .ok_or_else(|| PipelineError::InvalidLink(link.trim().to_string()))?;
        info!("Processing video {video_id}");

        let resolved = self.resolver.resolve(&self.client, &video_id).await?;
        let title = sanitize_title(&resolved.title, self.options.strict_sanitize);

        let audio = fetch::fetch_audio(&self.client, &resolved.download_url).await?;
        let (thumbnail, thumbnail_name) =
            fetch::fetch_thumbnail(&self.client, &self.options.thumbnail_base, &video_id).await?;

        let songs_folder = self
            .storage
            .ensure_folder(&self.client, &self.options.songs_folder)
            .await?;
        let images_folder = self
            .storage
            .ensure_folder(&self.client, &self.options.images_folder)
            .await?;

        let file_id = self
            .storage
            .upload(&self.client, songs_folder, &format!("{title}.mp3"), audio)
            .await?;
        let img_id = self
            .storage
            .upload(&self.client, images_folder, &thumbnail_name, thumbnail)
            .await?;

        let audio_url = self.maybe_public_link(file_id).await?;
        let image_url = self.maybe_public_link(img_id).await?;

        let track_tags = self.classifier.classify(&self.client, &title).await?;

        let record = TrackRecord {
            file_id,
            img_id,
            name: title,
            artist: track_tags.artist,
            language: track_tags.language,
            tags: track_tags.tags,
            views: 0,
            likes: 0,
        };
        self.store.insert(&self.client, &record).await?;
        info!("Stored track {:?} (file {file_id}, image {img_id})", record.name);

        Ok(ProcessOutcome {
            file_id,
            img_id,
            name: record.name,
            artist: record.artist,
            language: record.language,
            tags: record.tags,
            audio_url,
            image_url,
        })
    }

    /// Fetch a public link when enabled. Whether a failing link aborts the
    /// request or merely drops the field is a policy flag.
    async fn maybe_public_link(&self, file_id: u64) -> Result<Option<String>, PipelineError> {
        if !self.options.public_links {
            return Ok(None);
        }
        match self.storage.public_link(&self.client, file_id).await {
            Ok(link) => Ok(Some(link)),
            Err(e) if !self.options.public_link_required => {
                warn!("skipping public link for file {file_id}: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
