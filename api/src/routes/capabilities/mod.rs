pub mod get_capability_route;
pub mod search_capabilities_request;
pub mod search_capabilities_route;
