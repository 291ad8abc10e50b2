//! OpenAPI documentation and schema generation
//!
//! The specification is generated at compile time with utoipa and served at
//! `/openapi.json`.

use utoipa::OpenApi;

/// OpenAPI documentation for the mediagrab REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediagrab REST API",
        version = "0.1.0",
        description = "Extract media information, start downloads, poll their progress and release sessions",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://127.0.0.1:5000", description = "Local development server")
    ),
    paths(
        // Protocol
        crate::api::routes::extract,
        crate::api::routes::start_download,
        crate::api::routes::download_status,
        crate::api::routes::cleanup,

        // Files
        crate::api::routes::download_file,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::FormatKind,
        crate::types::JobStatus,

        // Wire types from protocol.rs
        crate::protocol::ExtractRequest,
        crate::protocol::ExtractResponse,
        crate::protocol::VideoPayload,
        crate::protocol::FormatPayload,
        crate::protocol::DownloadRequest,
        crate::protocol::DownloadResponse,
        crate::protocol::StatusResponse,
        crate::protocol::CleanupRequest,
        crate::protocol::CleanupResponse,

        // System
        crate::backend::BackendStats,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
    )),
    tags(
        (name = "protocol", description = "Session and download job lifecycle"),
        (name = "files", description = "Completed downloads"),
        (name = "system", description = "Health checks and the OpenAPI spec"),
    )
)]
pub struct ApiDoc;
