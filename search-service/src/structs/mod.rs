pub mod search_config;
pub mod search_result;
