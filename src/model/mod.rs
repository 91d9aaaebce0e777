//! Data models for the annotation engine.

mod annotation;
mod category;
mod page;

pub use annotation::{
    Annotation, AnnotationId, AnnotationLink, AnnotationPatch, AnnotationStore, AnnotationTable,
    BoundType, CellData, LinkType, PageToken,
};
pub use category::{Category, category_index};
pub use page::{PageSize, PageView};
