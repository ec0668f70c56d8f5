//! Multipart form collection with file fields staged to disk.

use std::collections::HashMap;

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use vidshare_core::error::CoreError;
use vidshare_media::{MediaError, StagedFile, Stager};

use crate::error::{AppError, AppResult};

/// Largest accepted text part. Leaves room for the longest description in
/// multi-byte UTF-8.
pub const TEXT_FIELD_MAX_BYTES: usize = 32 * 1024;

/// Text fields and staged files from one multipart request.
///
/// Staged files are removed when the form (or a file taken from it) is
/// dropped.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl MultipartForm {
    /// Drain `multipart`. Parts named in `file_fields` are streamed to the
    /// staging directory; everything else is read as text of at most
    /// [`TEXT_FIELD_MAX_BYTES`]. Empty file parts
    /// (a form submitted with no file chosen) count as absent.
    pub async fn collect(
        multipart: &mut Multipart,
        stager: &Stager,
        file_fields: &[&str],
    ) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if file_fields.contains(&name.as_str()) {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                match stager
                    .stage(file_name.as_deref(), content_type.as_deref(), field)
                    .await
                {
                    Ok(staged) => {
                        form.files.insert(name, staged);
                    }
                    Err(MediaError::Empty) => {}
                    Err(e) => return Err(e.into()),
                }
            } else {
                let text = read_text(field, &name).await?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A text field that must be present and non-blank.
    pub fn require_text(&self, name: &str) -> AppResult<&str> {
        self.text(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Core(CoreError::validation(format!("{name} is required"))))
    }

    /// A boolean text field (`true`/`false`), absent meaning `None`.
    pub fn flag(&self, name: &str) -> AppResult<Option<bool>> {
        match self.text(name).map(str::trim) {
            None | Some("") => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(AppError::Core(CoreError::validation(format!(
                "{name} must be 'true' or 'false', got '{other}'"
            )))),
        }
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }
}

/// Read a text part chunk by chunk, stopping as soon as it passes the cap.
async fn read_text(mut field: Field<'_>, name: &str) -> AppResult<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > TEXT_FIELD_MAX_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "{name} exceeds the {TEXT_FIELD_MAX_BYTES} byte limit"
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| AppError::BadRequest(format!("{name} is not valid UTF-8")))
}
