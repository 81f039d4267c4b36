//! Account, container and object operations as data.
//!
//! Each [`Operation`] knows its HTTP method, the path below the storage URL,
//! the statuses that count as success, and any headers it adds.
//!
//! Names are checked before anything is sent: a container is one non-empty
//! path segment, an object name is non-empty, and no segment may be `.` or
//! `..`, which URL normalization would otherwise collapse into a different
//! resource.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};

use crate::error::StorageError;

pub const QUOTA_HEADER: &str = "x-account-meta-quota-giga-bytes";
pub const DESTINATION_HEADER: &str = "destination";

const OK: &[StatusCode] = &[StatusCode::OK];
const OK_OR_NO_CONTENT: &[StatusCode] = &[StatusCode::OK, StatusCode::NO_CONTENT];
const CREATED: &[StatusCode] = &[StatusCode::CREATED];
const CREATED_OR_NO_CONTENT: &[StatusCode] = &[StatusCode::CREATED, StatusCode::NO_CONTENT];
const NO_CONTENT: &[StatusCode] = &[StatusCode::NO_CONTENT];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<'a> {
    ShowAccount,
    SetAccountQuota {
        gigabytes: u64,
    },
    ShowContainer {
        container: &'a str,
    },
    CreateContainer {
        container: &'a str,
    },
    DeleteContainer {
        container: &'a str,
    },
    GetObject {
        container: &'a str,
        object: &'a str,
    },
    UploadObject {
        container: &'a str,
        object: &'a str,
    },
    DownloadObject {
        container: &'a str,
        object: &'a str,
    },
    DeleteObject {
        container: &'a str,
        object: &'a str,
    },
    CopyObject {
        from_container: &'a str,
        from_object: &'a str,
        to_container: &'a str,
        to_object: &'a str,
    },
}

impl Operation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ShowAccount => "show_account",
            Operation::SetAccountQuota { .. } => "set_account_quota",
            Operation::ShowContainer { .. } => "show_container",
            Operation::CreateContainer { .. } => "create_container",
            Operation::DeleteContainer { .. } => "delete_container",
            Operation::GetObject { .. } => "get_object",
            Operation::UploadObject { .. } => "upload_object",
            Operation::DownloadObject { .. } => "download_object",
            Operation::DeleteObject { .. } => "delete_object",
            Operation::CopyObject { .. } => "copy_object",
        }
    }

    pub fn method(&self) -> Result<Method, StorageError> {
        Ok(match self {
            Operation::ShowAccount
            | Operation::ShowContainer { .. }
            | Operation::GetObject { .. }
            | Operation::DownloadObject { .. } => Method::GET,
            Operation::SetAccountQuota { .. } => Method::POST,
            Operation::CreateContainer { .. } | Operation::UploadObject { .. } => Method::PUT,
            Operation::DeleteContainer { .. } | Operation::DeleteObject { .. } => Method::DELETE,
            Operation::CopyObject { .. } => Method::from_bytes(b"COPY")
                .map_err(|e| StorageError::InvalidRequest(e.to_string()))?,
        })
    }

    /// Path below the storage URL, unencoded. Empty for the account root.
    pub fn path(&self) -> Result<String, StorageError> {
        match self {
            Operation::ShowAccount | Operation::SetAccountQuota { .. } => Ok(String::new()),
            Operation::ShowContainer { container }
            | Operation::CreateContainer { container }
            | Operation::DeleteContainer { container } => {
                Ok(container_name(container)?.to_string())
            }
            Operation::GetObject { container, object }
            | Operation::UploadObject { container, object }
            | Operation::DownloadObject { container, object }
            | Operation::DeleteObject { container, object } => object_path(container, object),
            Operation::CopyObject {
                from_container,
                from_object,
                ..
            } => object_path(from_container, from_object),
        }
    }

    pub fn acceptable(&self) -> &'static [StatusCode] {
        match self {
            Operation::ShowAccount | Operation::ShowContainer { .. } => OK_OR_NO_CONTENT,
            Operation::CreateContainer { .. } => CREATED_OR_NO_CONTENT,
            Operation::GetObject { .. } | Operation::DownloadObject { .. } => OK,
            Operation::UploadObject { .. } => CREATED,
            Operation::SetAccountQuota { .. }
            | Operation::DeleteContainer { .. }
            | Operation::DeleteObject { .. }
            | Operation::CopyObject { .. } => NO_CONTENT,
        }
    }

    pub fn headers(&self) -> Result<HeaderMap, StorageError> {
        let mut headers = HeaderMap::new();
        match self {
            Operation::SetAccountQuota { gigabytes } => {
                headers.insert(
                    HeaderName::from_static(QUOTA_HEADER),
                    HeaderValue::from(*gigabytes),
                );
            }
            Operation::CopyObject {
                to_container,
                to_object,
                ..
            } => {
                // Swift URL-decodes Destination, so it is encoded like the request path.
                let destination = encode_path(&object_path(to_container, to_object)?)?;
                let value = HeaderValue::from_str(&destination).map_err(|_| {
                    StorageError::InvalidRequest(format!(
                        "destination {destination:?} is not a valid header value"
                    ))
                })?;
                headers.insert(HeaderName::from_static(DESTINATION_HEADER), value);
            }
            _ => {}
        }
        Ok(headers)
    }
}

fn container_name(container: &str) -> Result<&str, StorageError> {
    let name = container.trim_end_matches('/');
    if name.is_empty() || name.contains('/') {
        return Err(StorageError::InvalidRequest(format!(
            "container name {container:?} must be a single non-empty path segment"
        )));
    }
    Ok(name)
}

/// `container/object`, without doubling a slash the caller already supplied.
fn object_path(container: &str, object: &str) -> Result<String, StorageError> {
    let container = container_name(container)?;
    let object = object.trim_start_matches('/');
    if object.is_empty() {
        return Err(StorageError::InvalidRequest(format!(
            "object name in container {container:?} must not be empty"
        )));
    }
    Ok(format!("{container}/{object}"))
}

/// Percent-encode each `/`-separated segment of `path`.
///
/// `.` and `..` segments are rejected rather than sent.
pub(crate) fn encode_path(path: &str) -> Result<String, StorageError> {
    path.split('/')
        .map(|segment| match segment {
            "." | ".." => Err(StorageError::InvalidRequest(format!(
                "path {path:?} contains a {segment:?} segment"
            ))),
            _ => Ok(urlencoding::encode(segment).into_owned()),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|segments| segments.join("/"))
}
