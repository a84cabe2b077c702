pub mod api_keys;
pub mod limits;
pub mod sanitize;
pub mod template;
