pub mod outreach_request;
pub mod query_request;

pub use outreach_request::*;
pub use query_request::*;
