//! Storyloom - AI 协作长篇小说创作服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Project Context: 创作项目与章节生产状态机
//! - Blueprint Context: 故事蓝图
//! - Conversation Context: 概念对话
//! - Metrics Context: 剧情指标与分卷
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ProjectRepository, StoryGenerator, AnalysisTaskManager, MutationGuard, Authenticator）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: 分析任务管理器、写操作互斥
//! - Worker: AnalysisWorker 后台分析
//! - Persistence: SQLite 存储
//! - Adapters: LLM 客户端、令牌认证
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
