mod pattern;
mod repository;
mod schema;

pub use pattern::glob_to_like;
pub use repository::Repository;
