//! Multipart upload endpoint at `/api/uploads`.

use autoroute::prelude::*;
use axum::Json;
use serde_json::json;

fn routes() -> ModuleExport {
    ModuleExport::Object(vec![HandlerSpec::new(
        "store",
        BoundHandler::sync(|req| {
            let upload = req
                .extensions()
                .get::<UploadedBody>()
                .cloned()
                .ok_or_else(|| RouteError::new("expected multipart/form-data").with_status(415))?;
            Ok::<_, RouteError>(Json(json!({
                "bytes": upload.size,
                "boundary": upload.boundary,
            })))
        }),
    )
    .meta(HandlerMetadata::new().name("index").post().file_upload_limit(1_000_000))])
}

autoroute::route_module!(routes);
