pub mod checkpoint;
pub mod front_report;
pub mod result_log;

pub use checkpoint::CheckpointManager;
pub use front_report::{front_report_path, write_front_report};
pub use result_log::{ResultLog, METRIC_PREFIX};
