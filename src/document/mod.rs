// src/document/mod.rs
pub mod model;

#[allow(unused_imports)]
pub use model::{DocumentModel, InstituteInfo, PageModel, RawTable};
