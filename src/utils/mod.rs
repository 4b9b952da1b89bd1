pub mod response;
pub mod student_cache;
pub mod token_filter;
