// HTTP service entry point and polling client.
use std::io;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use reqwest::Url;

mod cluster;
mod config;
mod handlers;

use crate::cluster::cluster_api::HttpClusterApi;
use crate::cluster::cluster_state_cache::ClusterStateCache;
use crate::cluster::cluster_state_service::ClusterStateService;
use crate::cluster::data_source::LiveClusterDataSource;
use crate::cluster::instance_summary::ResourceType;
use crate::cluster::polling::poll_until_fetched;
use crate::cluster::state_client::HttpStateClient;
use crate::cluster::static_provider::StaticClusterDataProvider;
use crate::config::{Args, Command, PollArgs, ServeArgs};
use crate::handlers::cluster_handler::{self, ClusterServices};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Args::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Poll(args) => poll(args).await,
    }
}

async fn serve(args: ServeArgs) -> io::Result<()> {
    let api_url = Url::parse(&args.api_endpoint)
        .map_err(|e| io::Error::other(format!("invalid --api-endpoint: {}", e)))?;
    let api = HttpClusterApi::new(api_url, args.api_token.clone()).map_err(io::Error::other)?;
    let live_source =
        LiveClusterDataSource::new(Arc::new(api), args.fetch_config()).map_err(io::Error::other)?;
    let demo_source = StaticClusterDataProvider::new(args.static_data_dir.clone(), &args.region);

    let services = ClusterServices {
        live: ClusterStateService::new(
            Arc::new(live_source),
            Arc::new(ClusterStateCache::new(args.cache_ttl())),
        ),
        demo: ClusterStateService::new(
            Arc::new(demo_source),
            Arc::new(ClusterStateCache::new(args.cache_ttl())),
        ),
    };

    // Expired records are also dropped lazily on read.
    let live_cache = services.live.cache().clone();
    let demo_cache = services.demo.cache().clone();
    let sweep_every = live_cache.ttl().max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            let purged = live_cache.purge_expired() + demo_cache.purge_expired();
            if purged > 0 {
                log::info!("Purged {} expired cluster states", purged);
            }
        }
    });

    log::info!("Listening on {}", args.listen_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(services.clone()))
            .configure(cluster_handler::configure)
    })
    .bind(&args.listen_addr)?
    .run()
    .await
}

async fn poll(args: PollArgs) -> io::Result<()> {
    let server_url = Url::parse(&args.server_url)
        .map_err(|e| io::Error::other(format!("invalid --server-url: {}", e)))?;
    let client = HttpStateClient::new(server_url, args.use_static).map_err(io::Error::other)?;
    if args.list {
        let names = client.cluster_names().await.map_err(io::Error::other)?;
        for name in names {
            println!("{}", name);
        }
        return Ok(());
    }
    let Some(cluster) = args.cluster.as_deref() else {
        return Err(io::Error::other("--cluster is required unless --list is given"));
    };
    let resource_type = ResourceType::parse(Some(&args.resource_type));

    let state = poll_until_fetched(&client, cluster, args.force_refresh, args.poll_policy())
        .await
        .map_err(io::Error::other)?;

    println!(
        "{} ({} instances, fetched at {})",
        state.cluster_name,
        state.instance_summaries.len(),
        state.create_timestamp
    );
    for summary in &state.instance_summaries {
        let registered = summary.registered(resource_type);
        let remaining = summary.remaining(resource_type);
        let tasks: Vec<&str> = summary.tasks.iter().map(|t| t.family_and_revision()).collect();
        println!(
            "{:<16} {:<20} {} {}/{} used, tasks: {}",
            summary.host_address,
            summary.host_id,
            resource_type.label(),
            registered - remaining,
            registered,
            tasks.join(" ")
        );
    }
    Ok(())
}
