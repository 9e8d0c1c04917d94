use std::collections::HashMap;

use once_cell::sync::Lazy;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("session is not linked, call authenticate first")]
    NotAuthenticated,
    #[error("connection failed: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("malformed response: {0}")]
    Protocol(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server returned {status}: {body}")]
    Server { status: StatusCode, body: String },
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("item does not exist anymore")]
    InvalidItem,
    #[error("operation not allowed: {0}")]
    OperationNotAllowed(String),
}

impl Error {
    /// Failures worth retrying: the service refused, the server misbehaved,
    /// or the session lapsed. Caller misuse (`Argument`) is not recoverable
    /// and always propagates.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Service(_) | Error::Server { .. } | Error::NotAuthenticated
        )
    }
}

/// Classifies a transport-level failure from the underlying HTTP client.
pub(crate) fn transport_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout(error)
    } else if error.is_connect() {
        Error::Connection(error)
    } else {
        Error::Protocol(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    General,
    Filesystem,
    Share,
    Folder,
    File,
    Endpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// Service failure with no mapped numeric code.
    Other,
    GeneralPanic,
    Api,
    ApiCallLimitReached,
    InvalidVersion,
    VersionMismatchIgnored,
    OriginalPathNoLongerExists,
    SharePathRequired,
    SharePathDoesNotExist,
    WouldExceedQuota,
    ShareDoesNotExist,
    FolderDoesNotExist,
    FolderNotFound,
    UploadToReadOnlyDestination,
    MoveToReadOnlyDestination,
    CopyToReadOnlyDestination,
    RenameOnReadOnlyLocation,
    DeleteOnReadOnlyLocation,
    CreateFolderOnReadOnlyLocation,
    FailedToReadFilesystem,
    NameConflictCreatingFolder,
    NameConflictOnUpload,
    NameConflictOnRename,
    NameConflictOnMove,
    NameConflictOnCopy,
    FailedToSaveChanges,
    FailedToBroadcastUpdate,
    CannotDeleteTheInfiniteDrive,
    MissingToParameter,
    ExistsParameterInvalid,
    MissingPathParameter,
    SpecifiedLocationIsReadOnly,
    SpecifiedSourceIsReadOnly,
    SpecifiedDestinationIsReadOnly,
    FolderPathDoesNotExist,
    PermissionDenied,
    RenamePermissionDenied,
    NameConflictInOperation,
    InvalidOperation,
    VersionMissingOrIncorrect,
    InvalidDepth,
    VersionDoesNotExist,
    FolderNameRequired,
    InvalidName,
    TreeRequired,
    InvalidVerbose,
    DirectoryNotEmpty,
    FileNotFound,
    FileInvalidOperation,
    FileInvalidName,
    InvalidExists,
    ExtensionTooLong,
    InvalidDateCreated,
    InvalidDateMetaLastModified,
    InvalidDateContentLastModified,
    MimeTooLong,
    SizeMustBePositive,
    NameRequired,
    SizeRequired,
    ToPathRequired,
    FileVersionMissingOrIncorrect,
    InvalidPath,
    AlreadyExists,
    NotAllowed,
}

impl ServiceErrorKind {
    pub fn category(self) -> ErrorCategory {
        use ServiceErrorKind::*;
        match self {
            Other | GeneralPanic | Api | ApiCallLimitReached => ErrorCategory::General,
            InvalidVersion | VersionMismatchIgnored | OriginalPathNoLongerExists => {
                ErrorCategory::Filesystem
            }
            SharePathRequired | SharePathDoesNotExist | WouldExceedQuota | ShareDoesNotExist => {
                ErrorCategory::Share
            }
            FileNotFound | FileInvalidOperation | FileInvalidName | InvalidExists
            | ExtensionTooLong | InvalidDateCreated | InvalidDateMetaLastModified
            | InvalidDateContentLastModified | MimeTooLong | SizeMustBePositive | NameRequired
            | SizeRequired | ToPathRequired | FileVersionMissingOrIncorrect => ErrorCategory::File,
            InvalidPath | AlreadyExists | NotAllowed => ErrorCategory::Endpoint,
            _ => ErrorCategory::Folder,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub code: Option<u16>,
    pub message: String,
    pub status: StatusCode,
    pub request: RequestContext,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "service error {:?} (code {:?}, http {}) on {} {}: {}",
            self.kind, self.code, self.status, self.request.method, self.request.url, self.message
        )
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Raised locally when a named-path segment cannot be resolved during a
    /// RECREATE restore traversal.
    pub(crate) fn missing_path_segment(segment: &str, request: RequestContext) -> Self {
        ServiceError {
            kind: ServiceErrorKind::FolderPathDoesNotExist,
            code: None,
            message: format!("named path segment '{segment}' does not exist"),
            status: StatusCode::NOT_FOUND,
            request,
        }
    }
}

// Error codes returned by the service, as documented. Several codes share a
// kind. The table builder warns on duplicate codes instead of silently
// overwriting; the later entry wins.
const SERVICE_ERROR_CODES: &[(u16, ServiceErrorKind)] = &[
    (9999, ServiceErrorKind::GeneralPanic),
    (9000, ServiceErrorKind::Api),
    (9006, ServiceErrorKind::ApiCallLimitReached),
    // filesystem / version errors
    (8001, ServiceErrorKind::InvalidVersion),
    (8002, ServiceErrorKind::VersionMismatchIgnored),
    (8004, ServiceErrorKind::OriginalPathNoLongerExists),
    // share errors
    (6001, ServiceErrorKind::SharePathRequired),
    (6002, ServiceErrorKind::SharePathDoesNotExist),
    (6003, ServiceErrorKind::WouldExceedQuota),
    (6004, ServiceErrorKind::ShareDoesNotExist),
    // folder errors
    (2002, ServiceErrorKind::FolderDoesNotExist),
    (2003, ServiceErrorKind::FolderNotFound),
    (2004, ServiceErrorKind::UploadToReadOnlyDestination),
    (2005, ServiceErrorKind::MoveToReadOnlyDestination),
    (2006, ServiceErrorKind::CopyToReadOnlyDestination),
    (2007, ServiceErrorKind::RenameOnReadOnlyLocation),
    (2008, ServiceErrorKind::DeleteOnReadOnlyLocation),
    (2009, ServiceErrorKind::CreateFolderOnReadOnlyLocation),
    (2010, ServiceErrorKind::FailedToReadFilesystem),
    (2011, ServiceErrorKind::FailedToReadFilesystem),
    (2012, ServiceErrorKind::FailedToReadFilesystem),
    (2013, ServiceErrorKind::FailedToReadFilesystem),
    (2014, ServiceErrorKind::NameConflictCreatingFolder),
    (2015, ServiceErrorKind::NameConflictOnUpload),
    (2016, ServiceErrorKind::NameConflictOnRename),
    (2017, ServiceErrorKind::NameConflictOnMove),
    (2018, ServiceErrorKind::NameConflictOnCopy),
    (2019, ServiceErrorKind::FailedToSaveChanges),
    (2020, ServiceErrorKind::FailedToSaveChanges),
    (2021, ServiceErrorKind::FailedToSaveChanges),
    (2022, ServiceErrorKind::FailedToBroadcastUpdate),
    (2023, ServiceErrorKind::FailedToBroadcastUpdate),
    (2024, ServiceErrorKind::FailedToSaveChanges),
    (2025, ServiceErrorKind::FailedToSaveChanges),
    (2026, ServiceErrorKind::CannotDeleteTheInfiniteDrive),
    (2028, ServiceErrorKind::MissingToParameter),
    (2033, ServiceErrorKind::ExistsParameterInvalid),
    (2034, ServiceErrorKind::MissingPathParameter),
    (2036, ServiceErrorKind::SpecifiedLocationIsReadOnly),
    (2037, ServiceErrorKind::SpecifiedSourceIsReadOnly),
    (2038, ServiceErrorKind::SpecifiedDestinationIsReadOnly),
    (2039, ServiceErrorKind::FolderPathDoesNotExist),
    (2040, ServiceErrorKind::PermissionDenied),
    (2041, ServiceErrorKind::RenamePermissionDenied),
    (2042, ServiceErrorKind::NameConflictInOperation),
    (2043, ServiceErrorKind::InvalidOperation),
    (2044, ServiceErrorKind::VersionMissingOrIncorrect),
    (2045, ServiceErrorKind::InvalidDepth),
    (2046, ServiceErrorKind::VersionDoesNotExist),
    (2047, ServiceErrorKind::FolderNameRequired),
    (2048, ServiceErrorKind::InvalidName),
    (2049, ServiceErrorKind::TreeRequired),
    (2050, ServiceErrorKind::InvalidVerbose),
    (2052, ServiceErrorKind::DirectoryNotEmpty),
    // file errors
    (3001, ServiceErrorKind::FileNotFound),
    (3007, ServiceErrorKind::FileInvalidOperation),
    (3008, ServiceErrorKind::FileInvalidName),
    (3009, ServiceErrorKind::InvalidExists),
    (3010, ServiceErrorKind::ExtensionTooLong),
    (3011, ServiceErrorKind::InvalidDateCreated),
    (3012, ServiceErrorKind::InvalidDateMetaLastModified),
    (3013, ServiceErrorKind::InvalidDateContentLastModified),
    (3014, ServiceErrorKind::MimeTooLong),
    (3015, ServiceErrorKind::SizeMustBePositive),
    (3018, ServiceErrorKind::NameRequired),
    (3019, ServiceErrorKind::SizeRequired),
    (3020, ServiceErrorKind::ToPathRequired),
    (3021, ServiceErrorKind::FileVersionMissingOrIncorrect),
    // endpoint errors
    (10000, ServiceErrorKind::InvalidPath),
    (10001, ServiceErrorKind::AlreadyExists),
    (10002, ServiceErrorKind::NotAllowed),
];

static CODE_TABLE: Lazy<HashMap<u16, ServiceErrorKind>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(SERVICE_ERROR_CODES.len());
    for &(code, kind) in SERVICE_ERROR_CODES {
        if let Some(previous) = table.insert(code, kind) {
            warn!(
                code,
                previous = ?previous,
                kept = ?kind,
                "duplicate service error code declared, later entry wins"
            );
        }
    }
    table
});

pub fn kind_for_code(code: u16) -> Option<ServiceErrorKind> {
    CODE_TABLE.get(&code).copied()
}

/// Converts a non-success HTTP response into the typed error taxonomy.
///
/// A JSON body carrying `error.code` maps to the specific kind; a JSON body
/// without a mapped code becomes the generic service kind; a body that is not
/// structured at all stays a plain server error.
pub(crate) fn map_server_error(status: StatusCode, body: String, request: RequestContext) -> Error {
    let parsed: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => return Error::Server { status, body },
    };

    let (code, message) = match parsed.get("error") {
        Some(serde_json::Value::Object(map)) => (
            map.get("code").and_then(|v| v.as_u64()).map(|c| c as u16),
            map.get("message")
                .and_then(|v| v.as_str())
                .unwrap_or(&body)
                .to_string(),
        ),
        Some(other) => (
            parsed
                .get("error_code")
                .and_then(|v| v.as_u64())
                .map(|c| c as u16),
            other.as_str().unwrap_or(&body).to_string(),
        ),
        None => (None, body.clone()),
    };

    let kind = code
        .and_then(kind_for_code)
        .unwrap_or(ServiceErrorKind::Other);
    Error::Service(ServiceError {
        kind,
        code,
        message,
        status,
        request,
    })
}
