//! `GET /`

use autoroute::prelude::*;
use axum::Json;
use serde_json::json;

fn routes() -> ModuleExport {
    ModuleExport::Function(HandlerSpec::new(
        "home",
        BoundHandler::sync(|_req| {
            Ok::<_, RouteError>(Json(json!({
                "service": "autoroute",
                "version": env!("CARGO_PKG_VERSION"),
            })))
        }),
    ))
}

autoroute::route_module!(routes);
