//! Worker Layer - Background Task Processing
//!
//! - AnalysisWorker: 处理章节分析任务
//! - AutoGeneratorSupervisor: 自动连续生成章节

mod analysis_worker;
mod auto_generator;

pub use analysis_worker::{AnalysisWorker, AnalysisWorkerConfig};
pub use auto_generator::{AutoGenPipeline, AutoGeneratorConfig, AutoGeneratorSupervisor};
