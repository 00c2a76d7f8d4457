pub mod error_masking;

pub use error_masking::mask_server_errors;
