mod auth_tests;
mod error_tests;
mod response_tests;
mod router_tests;
