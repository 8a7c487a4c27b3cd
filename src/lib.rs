pub mod fake_feed;
pub mod feed;
pub mod http_client;
pub mod newsletter;
pub mod persist;
pub mod report_fetch;
pub mod state;
