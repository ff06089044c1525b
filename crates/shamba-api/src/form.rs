//! Mutation bodies
//!
//! Listing, discussion and message writes accept `multipart/form-data`,
//! JSON or URL-encoded bodies. All three are flattened into ordered
//! key/value pairs plus buffered file parts. Files are checked against an
//! [`UploadPolicy`] while they stream in; nothing touches disk here.

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::{Form, Json};
use http::header::CONTENT_TYPE;
use serde_json::Value;
use shamba_types::{ListingDraft, PostDraft, MAX_IMAGES_PER_REQUEST};

use crate::error::{ApiError, ApiResult};

/// Per-file size cap
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Which file parts a route accepts
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    /// Multipart field carrying files
    pub field: &'static str,
    pub max_files: usize,
    pub max_file_size: usize,
    /// Lowercase extensions and MIME subtypes
    pub allowed: &'static [&'static str],
    /// Message for a rejected file type
    pub rejection: &'static str,
}

/// Listing photos: up to five under `images`
pub const LISTING_IMAGES: UploadPolicy = UploadPolicy {
    field: "images",
    max_files: MAX_IMAGES_PER_REQUEST,
    max_file_size: MAX_UPLOAD_BYTES,
    allowed: &["jpeg", "jpg", "png", "gif"],
    rejection: "Error: Images Only! (jpeg, jpg, png, gif)",
};

/// Discussion attachment: one file under `image`
pub const DISCUSSION_IMAGE: UploadPolicy = UploadPolicy {
    field: "image",
    max_files: 1,
    max_file_size: MAX_UPLOAD_BYTES,
    allowed: &["jpeg", "jpg", "png", "gif", "webp"],
    rejection: "Only image files are allowed.",
};

/// Text-only bodies
pub const NO_UPLOADS: UploadPolicy = UploadPolicy {
    field: "",
    max_files: 0,
    max_file_size: 0,
    allowed: &[],
    rejection: "Unexpected field",
};

impl UploadPolicy {
    /// Both the file extension and the declared MIME type must be allowed
    pub fn accepts(&self, file_name: &str, content_type: &str) -> bool {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let subtype = content_type
            .split(';')
            .next()
            .and_then(|mime| mime.trim().split('/').nth(1))
            .map(str::to_ascii_lowercase);

        match (extension, subtype) {
            (Some(ext), Some(sub)) => {
                self.allowed.contains(&ext.as_str()) && self.allowed.contains(&sub.as_str())
            }
            _ => false,
        }
    }
}

/// A buffered file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied name, used only to derive the stored name
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Flattened request body
#[derive(Debug, Default)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormPayload {
    /// Read the body according to its content type. Unknown or missing
    /// content types produce an empty payload.
    pub async fn parse(request: Request, policy: &UploadPolicy) -> ApiResult<Self> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart, policy).await
        } else if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(request, &())
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(Self::from_json(value))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(request, &())
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(Self {
                fields,
                files: Vec::new(),
            })
        } else {
            Ok(Self::default())
        }
    }

    async fn from_multipart(mut multipart: Multipart, policy: &UploadPolicy) -> ApiResult<Self> {
        let mut payload = Self::default();

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            let file_name = match field.file_name().map(str::to_string) {
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    payload.fields.push((name, value));
                    continue;
                }
                // Browsers send an empty file part when nothing was picked
                Some(file_name) if file_name.is_empty() => continue,
                Some(file_name) => file_name,
            };

            if name != policy.field || payload.files.len() >= policy.max_files {
                return Err(ApiError::BadRequest(format!("Unexpected field `{}`", name)));
            }

            let content_type = field.content_type().unwrap_or_default().to_string();
            if !policy.accepts(&file_name, &content_type) {
                return Err(ApiError::BadRequest(policy.rejection.to_string()));
            }

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                if bytes.len() + chunk.len() > policy.max_file_size {
                    return Err(ApiError::PayloadTooLarge("File too large".to_string()));
                }
                bytes.extend_from_slice(&chunk);
            }

            payload.files.push(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        }

        Ok(payload)
    }

    fn from_json(value: Value) -> Self {
        let mut fields = Vec::new();
        if let Value::Object(map) = value {
            for (key, value) in map {
                push_json(&mut fields, &key, value);
            }
        }
        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// First value sent under `name`
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    /// Every value sent under `name` or `name[]`, in order
    pub fn all(&self, name: &str) -> Vec<String> {
        let bracketed = format!("{}[]", name);
        self.fields
            .iter()
            .filter(|(key, _)| key == name || *key == bracketed)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn listing_draft(&self) -> ListingDraft {
        ListingDraft {
            title: self.text("title"),
            description: self.text("description"),
            price: self.text("price"),
            is_negotiable: self.text("isNegotiable"),
            category: self.text("category"),
            condition: self.text("condition"),
            location: self.text("location"),
        }
    }

    pub fn post_draft(&self) -> PostDraft {
        PostDraft {
            title: self.text("title"),
            content: self.text("content"),
            image_url: self.text("imageUrl"),
        }
    }
}

/// Scalars become text, arrays repeat the key, nulls count as absent
fn push_json(fields: &mut Vec<(String, String)>, key: &str, value: Value) {
    match value {
        Value::Null => {}
        Value::String(s) => fields.push((key.to_string(), s)),
        Value::Array(items) => {
            for item in items {
                push_json(fields, key, item);
            }
        }
        other => fields.push((key.to_string(), other.to_string())),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(content_type: &str, body: impl Into<Body>) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    #[test]
    fn test_policy_checks_extension_and_mime() {
        assert!(LISTING_IMAGES.accepts("plough.JPG", "image/jpeg"));
        assert!(!LISTING_IMAGES.accepts("plough.jpg", "application/pdf"));
        assert!(!LISTING_IMAGES.accepts("notes.pdf", "image/png"));
        assert!(!LISTING_IMAGES.accepts("photo.webp", "image/webp"));
        assert!(DISCUSSION_IMAGE.accepts("photo.webp", "image/webp"));
        assert!(!DISCUSSION_IMAGE.accepts("noext", "image/png"));
    }

    #[tokio::test]
    async fn test_json_body_flattens_arrays_and_scalars() {
        let body = r#"{"title":"Maize","price":2500,"isNegotiable":true,"existingImages":["uploads/a.png","uploads/b.png"],"condition":null}"#;
        let payload = FormPayload::parse(request("application/json", body), &LISTING_IMAGES)
            .await
            .unwrap();

        let draft = payload.listing_draft();
        assert_eq!(draft.title.as_deref(), Some("Maize"));
        assert_eq!(draft.price.as_deref(), Some("2500"));
        assert_eq!(draft.is_negotiable.as_deref(), Some("true"));
        assert_eq!(draft.condition, None);
        assert_eq!(payload.all("existingImages"), vec!["uploads/a.png", "uploads/b.png"]);
    }

    #[tokio::test]
    async fn test_urlencoded_repeated_keys() {
        let body = "content=Is+it+available%3F&existingImages=uploads%2Fa.png&existingImages%5B%5D=uploads%2Fb.png";
        let payload = FormPayload::parse(
            request("application/x-www-form-urlencoded", body),
            &NO_UPLOADS,
        )
        .await
        .unwrap();

        assert_eq!(payload.text("content").as_deref(), Some("Is it available?"));
        assert_eq!(payload.all("existingImages"), vec!["uploads/a.png", "uploads/b.png"]);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_empty() {
        let payload = FormPayload::parse(
            axum::http::Request::builder()
                .uri("/")
                .body(Body::empty())
                .unwrap(),
            &NO_UPLOADS,
        )
        .await
        .unwrap();
        assert_eq!(payload.text("title"), None);
        assert!(payload.files().is_empty());
    }

    fn multipart(parts: &[(&str, Option<(&str, &str)>, &str)]) -> Request {
        let boundary = "shamba-test-boundary";
        let mut body = String::new();
        for (name, file, value) in parts {
            body.push_str(&format!("--{}\r\n", boundary));
            match file {
                Some((file_name, mime)) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    name, file_name, mime
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", boundary));
        request(&format!("multipart/form-data; boundary={}", boundary), body)
    }

    #[tokio::test]
    async fn test_multipart_fields_and_files() {
        let req = multipart(&[
            ("title", None, "Hand plough"),
            ("images", Some(("my plough.png", "image/png")), "PNGDATA"),
        ]);
        let payload = FormPayload::parse(req, &LISTING_IMAGES).await.unwrap();

        assert_eq!(payload.text("title").as_deref(), Some("Hand plough"));
        assert_eq!(payload.files().len(), 1);
        assert_eq!(payload.files()[0].file_name, "my plough.png");
        assert_eq!(payload.files()[0].bytes, b"PNGDATA");
    }

    #[tokio::test]
    async fn test_multipart_rejects_wrong_type() {
        let req = multipart(&[("images", Some(("notes.txt", "text/plain")), "hello")]);
        let err = FormPayload::parse(req, &LISTING_IMAGES).await.unwrap_err();
        assert_eq!(err.to_string(), "Error: Images Only! (jpeg, jpg, png, gif)");
    }

    #[tokio::test]
    async fn test_multipart_rejects_extra_files() {
        let req = multipart(&[
            ("image", Some(("a.png", "image/png")), "A"),
            ("image", Some(("b.png", "image/png")), "B"),
        ]);
        let err = FormPayload::parse(req, &DISCUSSION_IMAGE).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
