pub mod as_the_crow_flies;
pub mod distance_oracle_client;
pub mod distance_oracle_provider;
pub mod google_maps_api;
pub mod leg_cache;
pub mod meters;
pub mod oracle;
pub mod resilient_oracle;
pub mod table_oracle;
