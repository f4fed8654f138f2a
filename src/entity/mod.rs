//! entity module
//! - bo: business objects passed between driver and device controller
//! - dto: objects serialized to readers

pub mod bo;
pub mod dto;
