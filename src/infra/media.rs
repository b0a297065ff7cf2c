//! Files under the content directory's `public/` folder, served at the site root.

use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum PublicFileError {
    #[error("invalid public path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct PublicFiles {
    root: PathBuf,
}

impl PublicFiles {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Read the file at a request path such as `/me.png`.
    ///
    /// Directories and missing files yield `Ok(None)`.
    pub async fn read(&self, request_path: &str) -> Result<Option<Bytes>, PublicFileError> {
        let absolute = self.resolve(request_path)?;
        match fs::metadata(&absolute).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        }
        let data = fs::read(absolute).await?;
        Ok(Some(Bytes::from(data)))
    }

    fn resolve(&self, request_path: &str) -> Result<PathBuf, PublicFileError> {
        let trimmed = request_path.trim_start_matches('/');
        let relative = Path::new(trimmed);
        if trimmed.is_empty()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            })
        {
            return Err(PublicFileError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

pub fn public_file_response(path: &str, bytes: Bytes) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    response
}
