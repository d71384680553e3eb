pub mod batched_describer;
pub mod clock;
pub mod cluster_api;
pub mod cluster_error;
pub mod cluster_state;
pub mod cluster_state_cache;
pub mod cluster_state_service;
pub mod data_source;
pub mod ecs_types;
pub mod fetch_config;
pub mod fetch_orchestrator;
pub mod instance_summary;
pub mod paginated_lister;
pub mod polling;
pub mod retry_policy;
pub mod state_client;
pub mod static_provider;
pub mod summary_assembler;
pub mod task_definition_memo;

#[cfg(test)]
mod test_cluster_api;
#[cfg(test)]
pub(crate) mod test_support;
