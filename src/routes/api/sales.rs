//! In-memory sales ledger under `/api/sales`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use autoroute::prelude::*;
use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::{Json, RequestExt};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sale {
    #[serde(default)]
    id: u64,
    item: String,
    amount_cents: u64,
}

#[derive(Default)]
struct Sales {
    next_id: AtomicU64,
    rows: DashMap<u64, Sale>,
}

impl Sales {
    fn list(&self) -> Vec<Sale> {
        let mut rows: Vec<Sale> = self.rows.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|s| s.id);
        rows
    }

    fn insert(&self, mut sale: Sale) -> Sale {
        sale.id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.rows.insert(sale.id, sale.clone());
        sale
    }
}

async fn sale_id(req: &mut Request<Body>) -> Result<u64, RouteError> {
    let Path(id) = req
        .extract_parts::<Path<u64>>()
        .await
        .map_err(|e| RouteError::new(e.body_text()).with_status(e.status().as_u16()))?;
    Ok(id)
}

fn parsed_sale(req: &Request<Body>) -> Result<Sale, RouteError> {
    match req.extensions().get::<ParsedBody>() {
        Some(ParsedBody::Json(value)) => serde_json::from_value(value.clone())
            .map_err(|e| RouteError::new(e.to_string()).with_status(422)),
        _ => Err(RouteError::new("expected a JSON body").with_status(415)),
    }
}

fn require_token() -> autoroute::http::MiddlewareRef {
    from_fn("require-token", |req: Request<Body>| async move {
        if req.headers().contains_key("x-admin-token") {
            Ok(MiddlewareResult::Continue(req))
        } else {
            Err(RouteError::new("missing admin token").with_status(401))
        }
    })
}

fn routes() -> ModuleExport {
    let sales = Arc::new(Sales::default());

    let list = {
        let sales = sales.clone();
        BoundHandler::sync(move |_req| Ok::<_, RouteError>(Json(sales.list())))
    };

    let show = {
        let sales = sales.clone();
        BoundHandler::new(move |mut req| {
            let sales = sales.clone();
            async move {
                let id = sale_id(&mut req).await?;
                let sale = sales
                    .rows
                    .get(&id)
                    .map(|r| r.value().clone())
                    .ok_or_else(|| RouteError::new(format!("sale {} not found", id)).with_status(404))?;
                Ok::<_, RouteError>(Json(sale))
            }
        })
    };

    let create = {
        let sales = sales.clone();
        BoundHandler::sync(move |req| {
            let sale = sales.insert(parsed_sale(&req)?);
            Ok::<_, RouteError>((StatusCode::CREATED, Json(sale)))
        })
    };

    let remove = {
        let sales = sales.clone();
        BoundHandler::new(move |mut req| {
            let sales = sales.clone();
            async move {
                let id = sale_id(&mut req).await?;
                match sales.rows.remove(&id) {
                    Some(_) => Ok::<_, RouteError>(StatusCode::NO_CONTENT),
                    None => Err(RouteError::new(format!("sale {} not found", id)).with_status(404)),
                }
            }
        })
    };

    let purge_denied = BoundHandler::error(|err: RouteError, head: RequestHead| async move {
        Ok::<_, RouteError>((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": err.message(), "request_id": head.request_id })),
        ))
    });

    ModuleExport::Class(
        ClassSpec::for_type::<Sales>()
            .method(HandlerSpec::new("list", list).meta(HandlerMetadata::new().name("index")))
            .method(HandlerSpec::new("show", show).meta(HandlerMetadata::new().name(":id")))
            .method(HandlerSpec::new("create", create).meta(HandlerMetadata::new().name("index").post()))
            .method(
                HandlerSpec::new("remove", remove)
                    .meta(HandlerMetadata::new().name(":id").delete().middleware(require_token())),
            )
            .method(
                HandlerSpec::new("purge", purge_denied)
                    .meta(HandlerMetadata::new().post().middleware(require_token())),
            ),
    )
}

autoroute::route_module!(routes);
