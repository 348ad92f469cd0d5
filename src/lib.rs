pub mod annotate;
pub mod cli;
pub mod config;
pub mod error;
pub mod linker;
pub mod logging;
pub mod normalize;

pub use annotate::{AnnotatePaths, AnnotateReport, AnnotatedDocument, Annotator, TermIndex};
pub use config::Settings;
pub use error::{AnnotateError, AnnotateResult};
pub use linker::TermLinker;
pub use normalize::{TermRecord, normalize_term, term_id};
