pub mod lead;
pub mod page;

pub use lead::{Lead, RawLead};
pub use page::{LeadPage, RawPage};
