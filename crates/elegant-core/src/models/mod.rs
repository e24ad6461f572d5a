//! Data models for Elegant Notes

mod color;
mod note;
mod sort;
mod tag;

pub use color::NoteColor;
pub use note::{Note, NoteId, NotePatch, PublicNote};
pub use sort::SortBy;
pub use tag::normalize_tag;
