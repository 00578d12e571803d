pub mod document;
pub mod score;
