//! Utility functions for upload validation and local file naming

use crate::config::{FileCollisionAction, UploadLimits};
use crate::error::{Error, Result};
use crate::types::UploadFile;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Check a file against the upload limits before sending it
///
/// Mirrors the checks the service applies on its side so obviously-bad
/// uploads fail fast, without a round trip.
///
/// # Examples
///
/// ```
/// use docviz_client::config::UploadLimits;
/// use docviz_client::types::UploadFile;
/// use docviz_client::utils::validate_upload;
///
/// let limits = UploadLimits::default();
/// assert!(validate_upload(&UploadFile::new("report.pdf", vec![1, 2, 3]), &limits).is_ok());
/// assert!(validate_upload(&UploadFile::new("setup.exe", vec![1]), &limits).is_err());
/// ```
pub fn validate_upload(file: &UploadFile, limits: &UploadLimits) -> Result<()> {
    if file.file_name.trim().is_empty() {
        return Err(Error::InvalidUpload {
            reason: "file name is empty".to_string(),
        });
    }

    let ext = file.extension().ok_or_else(|| Error::InvalidUpload {
        reason: format!("'{}' has no file extension", file.file_name),
    })?;
    if !limits.accepts_extension(&ext) {
        return Err(Error::InvalidUpload {
            reason: format!(
                "unsupported file type '{}', supported: {}",
                ext,
                limits.supported_extensions.join(", ")
            ),
        });
    }

    if file.bytes.is_empty() {
        return Err(Error::InvalidUpload {
            reason: format!("'{}' is empty", file.file_name),
        });
    }

    let size = file.bytes.len() as u64;
    if size > limits.max_file_size_bytes() {
        return Err(Error::InvalidUpload {
            reason: format!(
                "'{}' is {} bytes, limit is {} MB",
                file.file_name, size, limits.max_file_size_mb
            ),
        });
    }

    Ok(())
}

/// Get a unique path for a file, handling collisions according to the specified action
///
/// For Rename this may add a ` (n)` suffix, for Skip it fails if the file
/// already exists, and Overwrite returns the path unchanged.
///
/// # Examples
///
/// ```
/// use docviz_client::utils::get_unique_path;
/// use docviz_client::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/report_abc.html");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If /tmp/report_abc.html exists, returns /tmp/report_abc (1).html
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::FileCollision {
                    path: path.to_path_buf(),
                    reason: "file already exists and collision action is skip".to_string(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
                Error::FileCollision {
                    path: path.to_path_buf(),
                    reason: "cannot extract file stem".to_string(),
                }
            })?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().ok_or_else(|| Error::FileCollision {
                path: path.to_path_buf(),
                reason: "cannot extract parent directory".to_string(),
            })?;

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(Error::FileCollision {
                path: path.to_path_buf(),
                reason: format!(
                    "could not find unique filename after {} attempts",
                    MAX_RENAME_ATTEMPTS
                ),
            })
        }
    }
}
