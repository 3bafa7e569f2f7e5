pub mod app;
pub mod batch_runner;

pub use app::App;
pub use batch_runner::{BatchOutcome, BatchReport, BatchRunner, CancelFlag};
