// HTTP handlers for cluster state and cluster names.
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::cluster::cluster_error::ClusterError;
use crate::cluster::cluster_state_service::ClusterStateService;

/// The live and the demonstration pipelines, each with its own cache.
#[derive(Clone)]
pub struct ClusterServices {
    pub live: ClusterStateService,
    pub demo: ClusterStateService,
}

impl ClusterServices {
    pub fn select(&self, use_static: bool) -> &ClusterStateService {
        if use_static {
            &self.demo
        } else {
            &self.live
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    cluster: Option<String>,
    #[serde(rename = "static", default)]
    use_static: bool,
    #[serde(rename = "forceRefresh", default)]
    force_refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct NamesQuery {
    #[serde(rename = "static", default)]
    use_static: bool,
}

pub async fn instance_summaries_with_tasks(
    query: web::Query<StateQuery>,
    services: web::Data<ClusterServices>,
) -> Result<HttpResponse, ClusterError> {
    log::debug!("GET instance_summaries_with_tasks {:?}", query);
    let state = services
        .select(query.use_static)
        .get_cluster_state(query.cluster.as_deref(), query.force_refresh)?;
    Ok(HttpResponse::Ok().json(state))
}

pub async fn cluster_names(
    query: web::Query<NamesQuery>,
    services: web::Data<ClusterServices>,
) -> Result<HttpResponse, ClusterError> {
    let names = services.select(query.use_static).cluster_names().await?;
    log::info!("Listed {} cluster names (static: {})", names.len(), query.use_static);
    Ok(HttpResponse::Ok().json(names))
}

pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/instance_summaries_with_tasks")
            .route(web::get().to(instance_summaries_with_tasks)),
    )
    .service(web::resource("/api/cluster_names").route(web::get().to(cluster_names)))
    .service(web::resource("/healthz").route(web::get().to(healthz)));
}
