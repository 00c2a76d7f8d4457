pub mod requests;
pub mod responses;

pub use responses::ApiResponse;
