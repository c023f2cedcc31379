//! Fetching generated media and bundling it for bulk download.

use std::io::{Cursor, Write};

use deckreel_core::{Error, Result, VideoResult};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the archive produced by [`bundle_zip`] when saved to disk.
pub const BUNDLE_FILE_NAME: &str = "presentation_videos.zip";

/// File name for a slide's video, e.g. `slide_3.mp4`.
pub fn media_file_name(slide_number: usize) -> String {
    format!("slide_{}.mp4", slide_number)
}

/// Downloads generated media. The media URIs need the API key attached.
pub struct MediaFetcher {
    client: reqwest::Client,
    api_key: String,
}

impl MediaFetcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Fetch the bytes behind a media URI.
    pub async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(uri)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to fetch video: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("Failed to fetch video: {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read video body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    /// Fetch every result's video, in result order, paired with its slide number.
    pub async fn fetch_all(&self, results: &[VideoResult]) -> Result<Vec<(usize, Vec<u8>)>> {
        let mut videos = Vec::with_capacity(results.len());
        for (idx, result) in results.iter().enumerate() {
            log::info!("Fetching video {} of {}...", idx + 1, results.len());
            let bytes = self.fetch(&result.media_uri).await.map_err(|e| {
                Error::Transport(format!(
                    "Failed to fetch video for slide {}: {}",
                    result.slide_number, e
                ))
            })?;
            videos.push((result.slide_number, bytes));
        }
        Ok(videos)
    }
}

/// Pack videos into an in-memory zip with one `slide_<N>.mp4` entry each.
pub fn bundle_zip(videos: &[(usize, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    // Video payloads are already compressed.
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    for (slide_number, bytes) in videos {
        writer
            .start_file(media_file_name(*slide_number), options)
            .map_err(|e| Error::IoError(e.into()))?;
        writer.write_all(bytes)?;
    }

    let cursor = writer.finish().map_err(|e| Error::IoError(e.into()))?;
    Ok(cursor.into_inner())
}
