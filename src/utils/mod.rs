pub mod validation;

pub use validation::{is_valid_short_code, validate_short_code, validate_url};
