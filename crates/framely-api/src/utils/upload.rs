//! Multipart readers for the upload endpoints

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::Bytes;
use framely_core::AppError;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Image bytes read from the `file` field
#[derive(Debug)]
pub struct ImageFile {
    pub data: Bytes,
    pub file_name: String,
    pub content_type: String,
}

/// Video spooled to disk; the temporary file is removed when this is dropped
#[derive(Debug)]
pub struct SpooledFile {
    pub file: NamedTempFile,
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Default)]
pub struct VideoForm {
    pub file: Option<SpooledFile>,
    pub title: String,
    pub description: String,
}

fn file_name_of(field: &Field<'_>) -> String {
    field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or("upload")
        .to_string()
}

/// Read the first field named `file` into memory; `None` when the form has none
pub async fn extract_image_file(
    mut multipart: Multipart,
) -> Result<Option<ImageFile>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = file_name_of(&field);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;

        return Ok(Some(ImageFile {
            data,
            file_name,
            content_type,
        }));
    }

    Ok(None)
}

async fn spool_field(mut field: Field<'_>) -> Result<SpooledFile, AppError> {
    let file_name = file_name_of(&field);
    let spool = NamedTempFile::new()
        .map_err(|e| AppError::FormParsing(format!("Failed to create temporary file: {}", e)))?;
    let handle = spool
        .as_file()
        .try_clone()
        .map_err(|e| AppError::FormParsing(format!("Failed to open temporary file: {}", e)))?;
    let mut writer = tokio::fs::File::from_std(handle);

    let mut size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::FormParsing(e.to_string()))?
    {
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::FormParsing(format!("Failed to write temporary file: {}", e)))?;
        size += chunk.len() as u64;
    }
    writer
        .flush()
        .await
        .map_err(|e| AppError::FormParsing(format!("Failed to write temporary file: {}", e)))?;

    tracing::debug!(file_name = %file_name, size, path = %spool.path().display(), "Video spooled to disk");

    Ok(SpooledFile {
        file: spool,
        file_name,
        size,
    })
}

/// Stream the video form: `file` is spooled to a temporary file chunk by chunk,
/// `title` and `description` default to empty strings
pub async fn read_video_form(mut multipart: Multipart) -> Result<VideoForm, AppError> {
    let mut form = VideoForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::FormParsing(e.to_string()))?
    {
        match field.name() {
            Some("file") if form.file.is_none() => {
                form.file = Some(spool_field(field).await?);
            }
            Some("title") => {
                form.title = field
                    .text()
                    .await
                    .map_err(|e| AppError::FormParsing(e.to_string()))?;
            }
            Some("description") => {
                form.description = field
                    .text()
                    .await
                    .map_err(|e| AppError::FormParsing(e.to_string()))?;
            }
            _ => {}
        }
    }

    Ok(form)
}
