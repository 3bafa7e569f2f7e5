pub mod decompose;
pub mod export;
pub mod identity;
pub mod prompt;
pub mod style_analysis;

pub use decompose::DecomposeService;
pub use export::ExportService;
pub use style_analysis::StyleService;
