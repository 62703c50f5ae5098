//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                                        GET     健康检查（免认证）
//! - /api/novels                                      POST    新建项目
//! - /api/novels                                      GET     项目摘要列表
//! - /api/novels                                      DELETE  批量删除项目
//! - /api/novels/:id                                  GET     项目详情
//! - /api/novels/:id/chapters/:n                      GET     章节详情
//! - /api/novels/:id/concept/converse                 POST    概念对话一轮
//! - /api/novels/:id/blueprint/generate               POST    生成蓝图草稿
//! - /api/novels/:id/blueprint/save                   POST    保存蓝图
//! - /api/novels/:id/blueprint                        PATCH   按顶层字段修改蓝图
//! - /api/writer/novels/:id/chapters/generate         POST    生成候选版本
//! - /api/writer/novels/:id/chapters/evaluate         POST    评估候选版本
//! - /api/writer/novels/:id/chapters/select           POST    采用某个版本
//! - /api/writer/novels/:id/chapters/edit             POST    手工编辑正文
//! - /api/writer/novels/:id/chapters/update-outline   POST    修改章节标题与摘要
//! - /api/writer/novels/:id/chapters/delete           POST    删除章节
//! - /api/writer/novels/:id/chapters/outline          POST    续写大纲
//! - /api/novels/:id/story-metrics                    GET     剧情指标
//! - /api/novels/:id/auto-split                       POST    自动分卷
//! - /api/novels/:id/split-config                     GET/PUT 分卷配置
//! - /api/novels/:id/volumes                          GET     卷列表
//! - /api/async-analysis/tasks                        POST    提交分析任务
//! - /api/async-analysis/tasks                        GET     任务列表
//! - /api/async-analysis/tasks/:id                    GET     任务详情
//! - /api/async-analysis/tasks/:id/cancel             POST    取消任务
//! - /api/async-analysis/tasks/:id/retry              POST    重试失败任务
//! - /api/async-analysis/status                       GET     项目分析概览
//! - /api/async-analysis/novels/:id/chapters/:n/latest GET    章节最近一次分析任务
//! - /api/async-analysis/notifications                GET     分析通知
//! - /api/async-analysis/notifications/:id/read       POST    标记通知已读
//! - /api/async-analysis/notifications/read-all       POST    全部标记已读
//! - /api/auto-generator/tasks                        POST    创建自动生成任务
//! - /api/auto-generator/tasks/:id                    GET     任务详情
//! - /api/auto-generator/tasks/:id/start              POST    启动或恢复
//! - /api/auto-generator/tasks/:id/pause              POST    暂停
//! - /api/auto-generator/tasks/:id/stop               POST    停止
//! - /api/auto-generator/tasks/:id/logs               GET     任务日志
//! - /api/auto-generator/novels/:id/tasks             GET     项目下的自动生成任务
//! - /ws/events                                       WS      章节与任务事件

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::middleware::auth_middleware;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/api/ping", get(handlers::ping))
        .merge(protected)
}

/// API 路由（需要认证）
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/novels",
            post(handlers::create_project)
                .get(handlers::list_projects)
                .delete(handlers::delete_projects),
        )
        .nest("/novels", novel_routes())
        .nest("/writer/novels", writer_routes())
        .nest("/async-analysis", analysis_routes())
        .nest("/auto-generator", auto_generator_routes())
}

/// 项目、蓝图与分卷路由
fn novel_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(handlers::get_project))
        .route("/:id/chapters/:chapter_number", get(handlers::get_chapter))
        .route("/:id/concept/converse", post(handlers::converse))
        .route("/:id/blueprint/generate", post(handlers::generate_blueprint))
        .route("/:id/blueprint/save", post(handlers::save_blueprint))
        .route("/:id/blueprint", patch(handlers::update_blueprint))
        .route("/:id/story-metrics", get(handlers::story_metrics))
        .route("/:id/auto-split", post(handlers::auto_split))
        .route(
            "/:id/split-config",
            get(handlers::get_split_config).put(handlers::update_split_config),
        )
        .route("/:id/volumes", get(handlers::list_volumes))
}

/// 章节流水线路由
fn writer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id/chapters/generate", post(handlers::generate_chapter))
        .route("/:id/chapters/evaluate", post(handlers::evaluate_chapter))
        .route("/:id/chapters/select", post(handlers::select_version))
        .route("/:id/chapters/edit", post(handlers::edit_chapter))
        .route("/:id/chapters/update-outline", post(handlers::update_outline))
        .route("/:id/chapters/delete", post(handlers::delete_chapters))
        .route("/:id/chapters/outline", post(handlers::generate_outline))
}

/// 异步分析任务路由
fn analysis_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/tasks",
            post(handlers::submit_analysis).get(handlers::list_tasks),
        )
        .route("/tasks/:id", get(handlers::get_task))
        .route("/tasks/:id/cancel", post(handlers::cancel_task))
        .route("/tasks/:id/retry", post(handlers::retry_task))
        .route("/status", get(handlers::analysis_status))
        .route(
            "/novels/:id/chapters/:chapter_number/latest",
            get(handlers::latest_chapter_task),
        )
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/read-all",
            post(handlers::mark_all_notifications_read),
        )
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
}

/// 自动生成路由
fn auto_generator_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", post(handlers::create_auto_gen_task))
        .route("/tasks/:id", get(handlers::get_auto_gen_task))
        .route("/tasks/:id/start", post(handlers::start_auto_gen_task))
        .route("/tasks/:id/pause", post(handlers::pause_auto_gen_task))
        .route("/tasks/:id/stop", post(handlers::stop_auto_gen_task))
        .route("/tasks/:id/logs", get(handlers::auto_gen_logs))
        .route("/novels/:id/tasks", get(handlers::list_auto_gen_tasks))
}
