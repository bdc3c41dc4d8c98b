use serde::Deserialize;

/// Where uploaded files land and what may be uploaded.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Root directory for stored files. Default: "uploads".
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Per-file size limit in bytes. Default: 50 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Lower-case extensions accepted by every upload endpoint.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_upload_dir() -> String {
    "uploads".into()
}
fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024
}
fn default_allowed_extensions() -> Vec<String> {
    [
        "pdf", "doc", "docx", "ppt", "pptx", "mp4", "mp3", "wav", "jpg", "jpeg", "png", "gif",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_size: default_max_upload_size(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}
