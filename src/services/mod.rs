pub mod lead_query;

pub use lead_query::{LeadQueryService, Pagination, QuerySnapshot};
