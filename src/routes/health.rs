//! Liveness and readiness probes under `/health`.

use autoroute::prelude::*;

fn routes() -> ModuleExport {
    ModuleExport::Object(vec![
        HandlerSpec::new("live", BoundHandler::sync(|_req| Ok::<_, RouteError>("ok"))),
        HandlerSpec::new(
            "ready",
            BoundHandler::new(|_req| async { Ok::<_, RouteError>("ready") }),
        )
        .meta(HandlerMetadata::new().get().head()),
    ])
}

autoroute::route_module!(routes);
