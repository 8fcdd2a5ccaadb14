use bytes::Bytes;
use log::debug;
use reqwest::multipart;
use serde::Deserialize;

use crate::error::PipelineError;

/// Client for the pCloud REST API. Every response carries a numeric `result`
/// field; zero means success, anything else is a provider-side failure.
#[derive(Debug, Clone)]
pub struct StorageClient {
    base_url: String,
    auth: String,
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    result: i64,
    error: Option<String>,
    metadata: Option<FolderMetadata>,
}

#[derive(Debug, Deserialize)]
struct FolderMetadata {
    #[serde(default)]
    contents: Vec<FolderEntry>,
}

#[derive(Debug, Deserialize)]
struct FolderEntry {
    name: String,
    #[serde(default)]
    isfolder: bool,
    folderid: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateFolderResponse {
    result: i64,
    error: Option<String>,
    metadata: Option<CreatedFolder>,
}

#[derive(Debug, Deserialize)]
struct CreatedFolder {
    folderid: u64,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    result: i64,
    error: Option<String>,
    #[serde(default)]
    metadata: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    fileid: u64,
}

#[derive(Debug, Deserialize)]
struct PublicLinkResponse {
    result: i64,
    error: Option<String>,
    link: Option<String>,
}

fn ensure_ok(result: i64, error: Option<String>, op: &str) -> Result<(), PipelineError> {
    if result == 0 {
        return Ok(());
    }
    Err(PipelineError::upstream(
        "storage",
        format!(
            "{op} returned result {result}: {}",
            error.unwrap_or_else(|| "no error message".to_string())
        ),
    ))
}

impl StorageClient {
    pub fn new(base_url: String, auth: String) -> Self {
        StorageClient { base_url, auth }
    }

    /// Return the folder ID for a root-level folder, creating it if absent.
    ///
    /// Lookup and creation are two separate calls; concurrent callers can race
    /// and create duplicates, which this workload tolerates.
    pub async fn ensure_folder(
        &self,
        client: &reqwest::Client,
        name: &str,
    ) -> Result<u64, PipelineError> {
        let url = format!("{}/listfolder", self.base_url);
        let resp = client
            .get(&url)
            .query(&[("auth", self.auth.as_str()), ("folderid", "0")])
            .send()
            .await?;
        let listing: ListFolderResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::upstream("storage", e.to_string()))?;
        ensure_ok(listing.result, listing.error, "listfolder")?;

        let existing = listing
            .metadata
            .map(|m| m.contents)
            .unwrap_or_default()
            .into_iter()
            .find(|entry| entry.isfolder && entry.name == name)
            .and_then(|entry| entry.folderid);

        if let Some(folder_id) = existing {
            debug!("Folder {name:?} already exists: {folder_id}");
            return Ok(folder_id);
        }

        debug!("Creating folder {name:?}");
        let url = format!("{}/createfolder", self.base_url);
        let resp = client
            .get(&url)
            .query(&[
                ("auth", self.auth.as_str()),
                ("folderid", "0"),
                ("name", name),
            ])
            .send()
            .await?;
        let created: CreateFolderResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::upstream("storage", e.to_string()))?;
        ensure_ok(created.result, created.error, "createfolder")?;

        created
            .metadata
            .map(|m| m.folderid)
            .ok_or_else(|| PipelineError::upstream("storage", "createfolder returned no metadata"))
    }

    /// Upload an in-memory buffer under the given folder, returning the
    /// provider-assigned file ID.
    pub async fn upload(
        &self,
        client: &reqwest::Client,
        folder_id: u64,
        filename: &str,
        data: Bytes,
    ) -> Result<u64, PipelineError> {
        debug!("Uploading {filename} ({} bytes) to folder {folder_id}", data.len());

        let part = multipart::Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        let url = format!("{}/uploadfile", self.base_url);
        let resp = client
            .post(&url)
            .query(&[
                ("auth", self.auth.as_str()),
                ("folderid", &folder_id.to_string()),
                ("filename", filename),
            ])
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::upstream("storage", e.to_string()))?;
        ensure_ok(uploaded.result, uploaded.error, "uploadfile")?;

        uploaded
            .metadata
            .first()
            .map(|f| f.fileid)
            .ok_or_else(|| PipelineError::upstream("storage", "uploadfile returned no file entry"))
    }

    /// Request an unauthenticated public link for an uploaded file.
    pub async fn public_link(
        &self,
        client: &reqwest::Client,
        file_id: u64,
    ) -> Result<String, PipelineError> {
        let url = format!("{}/getfilepublink", self.base_url);
        let resp = client
            .get(&url)
            .query(&[("auth", self.auth.as_str()), ("fileid", &file_id.to_string())])
            .send()
            .await?;
        let link: PublicLinkResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::upstream("storage", e.to_string()))?;
        ensure_ok(link.result, link.error, "getfilepublink")?;

        link.link
            .ok_or_else(|| PipelineError::upstream("storage", "getfilepublink returned no link"))
    }
}
