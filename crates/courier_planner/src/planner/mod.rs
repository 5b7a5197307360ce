pub mod address_ranker;
pub mod cluster_search;
pub mod orchestrator;
pub mod planner_params;
pub mod route_builder;
