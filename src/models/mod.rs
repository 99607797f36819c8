mod article;

pub use article::{Article, SCORE_UNPARSEABLE};
