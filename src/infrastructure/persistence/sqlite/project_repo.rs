//! SQLite Project Repository

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{ChapterAnalysisRecord, ProjectRepositoryPort, RepositoryError};
use crate::domain::blueprint::Blueprint;
use crate::domain::metrics::{SplitConfig, Volume};
use crate::domain::project::{
    Chapter, ConversationMessage, GenerationStatus, MessageRole, Project, ProjectId, ProjectParts,
};

/// SQLite Project Repository
pub struct SqliteProjectRepository {
    pool: DbPool,
}

impl SqliteProjectRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, RepositoryError> {
        self.pool.begin().await.map_err(db_error)
    }
}

// ============================================================================
// 行映射
// ============================================================================

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

fn serde_error(e: serde_json::Error) -> RepositoryError {
    RepositoryError::SerializationError(e.to_string())
}

/// 固定微秒精度，保证按字符串排序与时间顺序一致
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

#[derive(FromRow)]
struct ProjectRow {
    id: String,
    title: String,
    initial_prompt: String,
    blueprint: Option<String>,
    split_config: String,
    created_at: String,
    updated_at: String,
}

#[derive(FromRow)]
struct ChapterRow {
    chapter_number: i64,
    title: String,
    summary: String,
    content: Option<String>,
    versions: String,
    evaluation: Option<String>,
    generation_status: String,
    word_count: i64,
}

impl TryFrom<ChapterRow> for Chapter {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        let generation_status = GenerationStatus::from_str(&row.generation_status).ok_or_else(|| {
            RepositoryError::SerializationError(format!(
                "unknown generation status: {}",
                row.generation_status
            ))
        })?;

        Ok(Chapter {
            chapter_number: row.chapter_number as u32,
            title: row.title,
            summary: row.summary,
            content: row.content,
            versions: serde_json::from_str(&row.versions).map_err(serde_error)?,
            evaluation: row.evaluation,
            generation_status,
            word_count: row.word_count as u32,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    role: String,
    content: String,
}

impl TryFrom<MessageRow> for ConversationMessage {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role = MessageRole::from_str(&row.role).ok_or_else(|| {
            RepositoryError::SerializationError(format!("unknown message role: {}", row.role))
        })?;
        Ok(ConversationMessage {
            role,
            content: row.content,
        })
    }
}

#[derive(FromRow)]
struct VolumeRow {
    volume_number: i64,
    title: String,
    description: String,
    start_chapter: i64,
    end_chapter: i64,
}

impl From<VolumeRow> for Volume {
    fn from(row: VolumeRow) -> Self {
        Volume {
            volume_number: row.volume_number as u32,
            title: row.title,
            description: row.description,
            start_chapter: row.start_chapter as u32,
            end_chapter: row.end_chapter as u32,
        }
    }
}

#[derive(FromRow)]
struct AnalysisRow {
    chapter_number: i64,
    result: String,
    analyzed_at: String,
}

impl TryFrom<AnalysisRow> for ChapterAnalysisRecord {
    type Error = RepositoryError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(ChapterAnalysisRecord {
            chapter_number: row.chapter_number as u32,
            result: serde_json::from_str(&row.result).map_err(serde_error)?,
            analyzed_at: parse_timestamp(&row.analyzed_at)?,
        })
    }
}

/// 更新项目的最后编辑时间；项目不存在时返回 NotFound
async fn touch_project(
    tx: &mut Transaction<'static, Sqlite>,
    id: ProjectId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE projects SET updated_at = ? WHERE id = ?")
        .bind(timestamp(Utc::now()))
        .bind(id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(id.to_string()));
    }
    Ok(())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map_or(false, |db| db.is_unique_violation())
}

// ============================================================================
// ProjectRepositoryPort
// ============================================================================

#[async_trait]
impl ProjectRepositoryPort for SqliteProjectRepository {
    async fn create(&self, project: &Project) -> Result<(), RepositoryError> {
        let blueprint = project
            .blueprint()
            .map(serde_json::to_string)
            .transpose()
            .map_err(serde_error)?;
        let split_config = serde_json::to_string(project.split_config()).map_err(serde_error)?;

        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, title, initial_prompt, blueprint, split_config, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id().to_string())
        .bind(project.title())
        .bind(project.initial_prompt())
        .bind(blueprint)
        .bind(split_config)
        .bind(timestamp(project.created_at()))
        .bind(timestamp(project.updated_at()))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Duplicate(project.id().to_string())
            } else {
                db_error(e)
            }
        })?;

        for chapter in project.chapters() {
            insert_chapter(&mut tx, project.id(), chapter).await?;
        }
        for message in project.conversation_history() {
            insert_message(&mut tx, project.id(), message).await?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row: Option<ProjectRow> = sqlx::query_as(
            "SELECT id, title, initial_prompt, blueprint, split_config, created_at, updated_at FROM projects WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let chapters: Vec<ChapterRow> = sqlx::query_as(
            r#"
            SELECT chapter_number, title, summary, content, versions, evaluation, generation_status, word_count
            FROM chapters WHERE project_id = ? ORDER BY chapter_number
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let messages: Vec<MessageRow> = sqlx::query_as(
            "SELECT role, content FROM conversation_messages WHERE project_id = ? ORDER BY id",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let parts = ProjectParts {
            id: ProjectId::from_uuid(
                Uuid::parse_str(&row.id)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            ),
            title: row.title,
            initial_prompt: row.initial_prompt,
            blueprint: row
                .blueprint
                .as_deref()
                .map(serde_json::from_str::<Blueprint>)
                .transpose()
                .map_err(serde_error)?,
            chapters: chapters
                .into_iter()
                .map(Chapter::try_from)
                .collect::<Result<_, _>>()?,
            conversation_history: messages
                .into_iter()
                .map(ConversationMessage::try_from)
                .collect::<Result<_, _>>()?,
            split_config: serde_json::from_str::<SplitConfig>(&row.split_config)
                .map_err(serde_error)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        };

        Ok(Some(Project::restore(parts)))
    }

    async fn find_all(&self) -> Result<Vec<Project>, RepositoryError> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM projects ORDER BY updated_at DESC, rowid DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

        let mut projects = Vec::with_capacity(ids.len());
        for (raw_id,) in ids {
            let id = ProjectId::from_uuid(
                Uuid::parse_str(&raw_id)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            );
            // 并发删除时跳过已消失的项目
            if let Some(project) = self.find_by_id(id).await? {
                projects.push(project);
            }
        }
        Ok(projects)
    }

    async fn delete_many(&self, ids: &[ProjectId]) -> Result<(), RepositoryError> {
        // 使用事务确保全部成功或全部回滚
        let mut tx = self.begin().await?;

        for id in ids {
            let id = id.to_string();
            for table in ["chapters", "conversation_messages", "chapter_analyses", "volumes"] {
                sqlx::query(&format!("DELETE FROM {} WHERE project_id = ?", table))
                    .bind(&id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
            }

            let result = sqlx::query("DELETE FROM projects WHERE id = ?")
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            if result.rows_affected() == 0 {
                // tx drop 时回滚
                return Err(RepositoryError::NotFound(id));
            }
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn append_messages(
        &self,
        id: ProjectId,
        messages: &[ConversationMessage],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        touch_project(&mut tx, id).await?;
        for message in messages {
            insert_message(&mut tx, id, message).await?;
        }
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn save_blueprint(
        &self,
        id: ProjectId,
        blueprint: &Blueprint,
        chapters: &[Chapter],
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(blueprint).map_err(serde_error)?;
        let mut tx = self.begin().await?;

        touch_project(&mut tx, id).await?;
        sqlx::query("UPDATE projects SET blueprint = ? WHERE id = ?")
            .bind(json)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        // 已有章节只更新标题与摘要，生产字段保持不变
        for chapter in chapters {
            sqlx::query(
                r#"
                INSERT INTO chapters (project_id, chapter_number, title, summary, content, versions, evaluation, generation_status, word_count)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(project_id, chapter_number) DO UPDATE SET
                    title = excluded.title,
                    summary = excluded.summary
                "#,
            )
            .bind(id.to_string())
            .bind(chapter.chapter_number as i64)
            .bind(&chapter.title)
            .bind(&chapter.summary)
            .bind(&chapter.content)
            .bind(serde_json::to_string(&chapter.versions).map_err(serde_error)?)
            .bind(&chapter.evaluation)
            .bind(chapter.generation_status.as_str())
            .bind(chapter.word_count as i64)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn save_chapter_progress(
        &self,
        id: ProjectId,
        chapter: &Chapter,
    ) -> Result<(), RepositoryError> {
        let versions = serde_json::to_string(&chapter.versions).map_err(serde_error)?;
        let mut tx = self.begin().await?;

        touch_project(&mut tx, id).await?;
        let result = sqlx::query(
            r#"
            UPDATE chapters SET
                content = ?,
                versions = ?,
                evaluation = ?,
                generation_status = ?,
                word_count = ?
            WHERE project_id = ? AND chapter_number = ?
            "#,
        )
        .bind(&chapter.content)
        .bind(versions)
        .bind(&chapter.evaluation)
        .bind(chapter.generation_status.as_str())
        .bind(chapter.word_count as i64)
        .bind(id.to_string())
        .bind(chapter.chapter_number as i64)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "{}/chapter/{}",
                id, chapter.chapter_number
            )));
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn delete_chapters(
        &self,
        id: ProjectId,
        numbers: &[u32],
        blueprint: Option<&Blueprint>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        touch_project(&mut tx, id).await?;

        for number in numbers {
            for table in ["chapters", "chapter_analyses"] {
                sqlx::query(&format!(
                    "DELETE FROM {} WHERE project_id = ? AND chapter_number = ?",
                    table
                ))
                .bind(id.to_string())
                .bind(*number as i64)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        if let Some(blueprint) = blueprint {
            sqlx::query("UPDATE projects SET blueprint = ? WHERE id = ?")
                .bind(serde_json::to_string(blueprint).map_err(serde_error)?)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn save_split_config(
        &self,
        id: ProjectId,
        config: &SplitConfig,
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(config).map_err(serde_error)?;
        let mut tx = self.begin().await?;
        touch_project(&mut tx, id).await?;
        sqlx::query("UPDATE projects SET split_config = ? WHERE id = ?")
            .bind(json)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn find_volumes(&self, id: ProjectId) -> Result<Vec<Volume>, RepositoryError> {
        let rows: Vec<VolumeRow> = sqlx::query_as(
            r#"
            SELECT volume_number, title, description, start_chapter, end_chapter
            FROM volumes WHERE project_id = ? ORDER BY volume_number
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Volume::from).collect())
    }

    async fn append_volumes(
        &self,
        id: ProjectId,
        volumes: &[Volume],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        touch_project(&mut tx, id).await?;

        for volume in volumes {
            sqlx::query(
                r#"
                INSERT INTO volumes (project_id, volume_number, title, description, start_chapter, end_chapter)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(volume.volume_number as i64)
            .bind(&volume.title)
            .bind(&volume.description)
            .bind(volume.start_chapter as i64)
            .bind(volume.end_chapter as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Duplicate(format!("{}/volume/{}", id, volume.volume_number))
                } else {
                    db_error(e)
                }
            })?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn save_chapter_analysis(
        &self,
        id: ProjectId,
        chapter_number: u32,
        result: &Value,
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(result).map_err(serde_error)?;
        let mut tx = self.begin().await?;
        touch_project(&mut tx, id).await?;

        sqlx::query(
            r#"
            INSERT INTO chapter_analyses (project_id, chapter_number, result, analyzed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(project_id, chapter_number) DO UPDATE SET
                result = excluded.result,
                analyzed_at = excluded.analyzed_at
            "#,
        )
        .bind(id.to_string())
        .bind(chapter_number as i64)
        .bind(json)
        .bind(timestamp(Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn find_chapter_analyses(
        &self,
        id: ProjectId,
    ) -> Result<Vec<ChapterAnalysisRecord>, RepositoryError> {
        let rows: Vec<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT chapter_number, result, analyzed_at
            FROM chapter_analyses WHERE project_id = ? ORDER BY chapter_number
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ChapterAnalysisRecord::try_from).collect()
    }

    async fn recover_interrupted_chapters(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE chapters SET generation_status = ? WHERE generation_status = ?")
            .bind(GenerationStatus::Failed.as_str())
            .bind(GenerationStatus::Generating.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}

async fn insert_chapter(
    tx: &mut Transaction<'static, Sqlite>,
    id: ProjectId,
    chapter: &Chapter,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO chapters (project_id, chapter_number, title, summary, content, versions, evaluation, generation_status, word_count)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(chapter.chapter_number as i64)
    .bind(&chapter.title)
    .bind(&chapter.summary)
    .bind(&chapter.content)
    .bind(serde_json::to_string(&chapter.versions).map_err(serde_error)?)
    .bind(&chapter.evaluation)
    .bind(chapter.generation_status.as_str())
    .bind(chapter.word_count as i64)
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;
    Ok(())
}

async fn insert_message(
    tx: &mut Transaction<'static, Sqlite>,
    id: ProjectId,
    message: &ConversationMessage,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO conversation_messages (project_id, role, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(timestamp(Utc::now()))
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::blueprint::ChapterOutline;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
    use serde_json::json;

    async fn setup() -> SqliteProjectRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteProjectRepository::new(pool)
    }

    fn blueprint(chapters: u32) -> Blueprint {
        let mut blueprint = Blueprint::default();
        blueprint.title = "破晓".into();
        for n in 1..=chapters {
            blueprint.upsert_outline(ChapterOutline::new(n, format!("第{}章", n), format!("摘要{}", n)));
        }
        blueprint
    }

    async fn saved_project(repo: &SqliteProjectRepository, chapters: u32) -> Project {
        let mut project = Project::new("破晓", "一座被黑夜封锁的城").unwrap();
        repo.create(&project).await.unwrap();
        project.apply_blueprint(blueprint(chapters));
        let blueprint = project.blueprint().cloned().unwrap();
        repo.save_blueprint(project.id(), &blueprint, project.chapters())
            .await
            .unwrap();
        repo.find_by_id(project.id()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_load_round_trip() {
        let repo = setup().await;
        let project = Project::new("破晓", "一座被黑夜封锁的城").unwrap();
        repo.create(&project).await.unwrap();
        repo.append_messages(
            project.id(),
            &[
                ConversationMessage::user("写一个奇幻故事"),
                ConversationMessage::assistant("好的，主角是谁？"),
            ],
        )
        .await
        .unwrap();

        let loaded = repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(loaded.title(), "破晓");
        assert_eq!(loaded.conversation_history().len(), 2);
        assert_eq!(loaded.conversation_history()[0].role, MessageRole::User);
        assert!(loaded.blueprint().is_none());
        assert!(loaded.updated_at() >= project.updated_at());

        assert!(matches!(
            repo.create(&project).await,
            Err(RepositoryError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_outline_save_keeps_pipeline_columns() {
        let repo = setup().await;
        let project = saved_project(&repo, 2).await;

        let mut chapter = project.chapter(1).unwrap().clone();
        chapter.edit_content("城门在黎明前打开。".into());
        repo.save_chapter_progress(project.id(), &chapter)
            .await
            .unwrap();

        // 用过期的章节快照更新大纲，正文不能被覆盖
        let mut stale = project.chapter(1).unwrap().clone();
        stale.update_outline("新标题", "新摘要");
        let blueprint = project.blueprint().cloned().unwrap();
        repo.save_blueprint(project.id(), &blueprint, &[stale])
            .await
            .unwrap();

        let loaded = repo.find_by_id(project.id()).await.unwrap().unwrap();
        let chapter = loaded.chapter(1).unwrap();
        assert_eq!(chapter.title, "新标题");
        assert_eq!(chapter.content.as_deref(), Some("城门在黎明前打开。"));
        assert_eq!(chapter.generation_status, GenerationStatus::Successful);
    }

    #[tokio::test]
    async fn test_delete_many_is_all_or_nothing() {
        let repo = setup().await;
        let first = saved_project(&repo, 1).await;
        let second = saved_project(&repo, 1).await;

        let result = repo.delete_many(&[first.id(), ProjectId::new()]).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
        assert!(repo.find_by_id(first.id()).await.unwrap().is_some());

        repo.delete_many(&[first.id(), second.id()]).await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_chapters_keeps_numbers_and_drops_analysis() {
        let repo = setup().await;
        let mut project = saved_project(&repo, 5).await;
        repo.save_chapter_analysis(project.id(), 3, &json!({ "key_events": [] }))
            .await
            .unwrap();

        project.remove_chapters(&[3]).unwrap();
        repo.delete_chapters(project.id(), &[3], project.blueprint())
            .await
            .unwrap();

        let loaded = repo.find_by_id(project.id()).await.unwrap().unwrap();
        let numbers: Vec<u32> = loaded.chapters().iter().map(|c| c.chapter_number).collect();
        assert_eq!(numbers, vec![1, 2, 4, 5]);
        assert!(repo
            .find_chapter_analyses(project.id())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_analysis_overwrites_previous_result() {
        let repo = setup().await;
        let project = saved_project(&repo, 1).await;
        repo.save_chapter_analysis(project.id(), 1, &json!({ "v": 1 }))
            .await
            .unwrap();
        repo.save_chapter_analysis(project.id(), 1, &json!({ "v": 2 }))
            .await
            .unwrap();

        let analyses = repo.find_chapter_analyses(project.id()).await.unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].result, json!({ "v": 2 }));
    }

    #[tokio::test]
    async fn test_volumes_and_split_config() {
        let repo = setup().await;
        let project = saved_project(&repo, 4).await;
        let volume = Volume {
            volume_number: 1,
            title: "卷一·第1-4章".into(),
            description: String::new(),
            start_chapter: 1,
            end_chapter: 4,
        };
        repo.append_volumes(project.id(), &[volume.clone()])
            .await
            .unwrap();
        assert!(matches!(
            repo.append_volumes(project.id(), &[volume.clone()]).await,
            Err(RepositoryError::Duplicate(_))
        ));
        assert_eq!(repo.find_volumes(project.id()).await.unwrap(), vec![volume]);

        let config = SplitConfig {
            enabled: false,
            ..SplitConfig::default()
        };
        repo.save_split_config(project.id(), &config).await.unwrap();
        let loaded = repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(loaded.split_config(), &config);
    }

    #[tokio::test]
    async fn test_recover_interrupted_generation() {
        let repo = setup().await;
        let project = saved_project(&repo, 3).await;
        let mut chapter = project.chapter(1).unwrap().clone();
        chapter.edit_content("旧正文".into());
        chapter.begin_generation().unwrap();
        repo.save_chapter_progress(project.id(), &chapter)
            .await
            .unwrap();
        let mut evaluating = project.chapter(3).unwrap().clone();
        evaluating.begin_generation().unwrap();
        evaluating.complete_generation(vec!["候选".into()], true).unwrap();
        repo.save_chapter_progress(project.id(), &evaluating)
            .await
            .unwrap();

        assert_eq!(repo.recover_interrupted_chapters().await.unwrap(), 1);
        let loaded = repo.find_by_id(project.id()).await.unwrap().unwrap();
        assert_eq!(
            loaded.chapter(1).unwrap().generation_status,
            GenerationStatus::Failed
        );
        assert_eq!(loaded.chapter(1).unwrap().content.as_deref(), Some("旧正文"));
        assert_eq!(
            loaded.chapter(2).unwrap().generation_status,
            GenerationStatus::NotGenerated
        );
        assert_eq!(
            loaded.chapter(3).unwrap().generation_status,
            GenerationStatus::Evaluating
        );
        assert_eq!(repo.recover_interrupted_chapters().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_progress_on_missing_project() {
        let repo = setup().await;
        let chapter = Chapter::new(1, "第1章", "摘要");
        assert!(matches!(
            repo.save_chapter_progress(ProjectId::new(), &chapter).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
