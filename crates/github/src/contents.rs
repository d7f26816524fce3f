//! Repository file fetching.
//!
//! The [`ContentSource`] trait is the seam between remote config loading
//! and the GitHub contents API. Implementations return the file exactly as
//! the API transports it (base64 with embedded line breaks); use
//! [`decode_content`] to recover the text.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hubbot_protocol::RepoRef;
use tracing::{debug, instrument};

use crate::client::GitHubClient;
use crate::error::{Error, Result};

/// Something that can fetch a file from a repository.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches the transport-encoded content of `path` in `repo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist. Any other
    /// error means the fetch itself failed.
    async fn fetch_file(&self, repo: &RepoRef, path: &str) -> Result<String>;
}

#[async_trait]
impl ContentSource for GitHubClient {
    #[instrument(skip(self), fields(repo = %repo.full_name()))]
    async fn fetch_file(&self, repo: &RepoRef, path: &str) -> Result<String> {
        let response = self
            .inner()
            .repos(&repo.owner, &repo.repo)
            .get_content()
            .path(path)
            .send()
            .await;

        let items = match response {
            Ok(items) => items.items,
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                debug!("repository file not found");
                return Err(Error::NotFound {
                    path: path.to_string(),
                });
            }
            Err(e) => return Err(Error::Api(e)),
        };

        match <[_; 1]>::try_from(items) {
            Ok([item]) => item.content.ok_or_else(|| Error::NotAFile {
                path: path.to_string(),
            }),
            Err(_) => Err(Error::NotAFile {
                path: path.to_string(),
            }),
        }
    }
}

/// Decodes base64 file content as returned by the contents API.
///
/// Line breaks and other ASCII whitespace inside the payload are ignored.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the content is not valid base64 or does not
/// decode to UTF-8.
///
/// # Examples
///
/// ```
/// use hubbot_github::contents::decode_content;
///
/// let text = decode_content("config.yml", "Zm9vOiA1\nCg==").unwrap();
/// assert_eq!(text, "foo: 5\n");
/// ```
pub fn decode_content(path: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD.decode(compact).map_err(|e| Error::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    String::from_utf8(bytes).map_err(|e| Error::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
