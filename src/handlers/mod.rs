pub mod cluster_handler;
