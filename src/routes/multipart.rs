use std::collections::HashMap;

use axum::extract::{DefaultBodyLimit, Multipart};
use uuid::Uuid;

use crate::{config::StorageConfig, error::AppError, services::media_service::UploadedFile};

/// Per-file limits are enforced by the media service; this caps the whole
/// body with some room for the text fields.
pub fn upload_body_limit(cfg: &StorageConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(cfg.max_file_size_bytes.saturating_mul(cfg.max_files.max(1)) + 64 * 1024)
}

/// A multipart body split into text fields and files.
#[derive(Debug, Default)]
pub struct FormParts {
    fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl FormParts {
    /// Reads every part; only parts named in `file_fields` may carry files.
    pub async fn read(mut multipart: Multipart, file_fields: &[&str]) -> Result<Self, AppError> {
        let mut parts = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::bad_request(format!("Invalid multipart body: {err}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    if !file_fields.contains(&name.as_str()) {
                        return Err(AppError::bad_request(format!(
                            "Unexpected file field: {name}"
                        )));
                    }
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            mime_guess::from_path(&file_name)
                                .first_or_octet_stream()
                                .to_string()
                        });
                    let bytes = field.bytes().await.map_err(|err| {
                        AppError::bad_request(format!("Failed to read upload: {err}"))
                    })?;
                    parts.files.push(UploadedFile {
                        field_name: name,
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let value = field.text().await.map_err(|err| {
                        AppError::bad_request(format!("Invalid form field {name}: {err}"))
                    })?;
                    parts.fields.insert(name, value);
                }
            }
        }
        Ok(parts)
    }

    pub fn text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn required(&mut self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::bad_request(format!("{name} is required")))
    }

    pub fn uuid(&mut self, name: &str) -> Result<Option<Uuid>, AppError> {
        match self.text(name).filter(|value| !value.trim().is_empty()) {
            Some(raw) => Uuid::parse_str(raw.trim())
                .map(Some)
                .map_err(|_| AppError::bad_request(format!("{name} must be a valid id"))),
            None => Ok(None),
        }
    }

    pub fn flag(&mut self, name: &str) -> Result<Option<bool>, AppError> {
        match self.text(name).as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some("true") | Some("1") => Ok(Some(true)),
            Some("false") | Some("0") => Ok(Some(false)),
            Some(_) => Err(AppError::bad_request(format!("{name} must be a boolean"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FormParts;

    fn parts(pairs: &[(&str, &str)]) -> FormParts {
        let mut form = FormParts::default();
        for (name, value) in pairs {
            form.fields.insert(name.to_string(), value.to_string());
        }
        form
    }

    #[test]
    fn parses_typed_fields() {
        let id = uuid::Uuid::new_v4();
        let mut form = parts(&[("published", "true"), ("role_id", &id.to_string())]);
        assert_eq!(form.flag("published").expect("flag"), Some(true));
        assert_eq!(form.uuid("role_id").expect("uuid"), Some(id));
        assert_eq!(form.flag("missing").expect("flag"), None);
    }

    #[test]
    fn rejects_malformed_values() {
        let mut form = parts(&[("published", "maybe"), ("role_id", "nope"), ("title", " ")]);
        assert!(form.flag("published").is_err());
        assert!(form.uuid("role_id").is_err());
        assert_eq!(
            form.required("title").expect_err("blank").message(),
            "title is required"
        );
    }
}
