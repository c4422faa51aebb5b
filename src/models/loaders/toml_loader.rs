use crate::models::question::QuestionDraft;
use crate::models::template::ExamTemplate;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 手工录入的题目文件
#[derive(Debug, Deserialize)]
struct QuestionFile {
    #[serde(default)]
    questions: Vec<QuestionDraft>,
}

/// 从 TOML 文件加载手工录入的题目
pub async fn load_question_file(toml_file_path: &Path) -> Result<Vec<QuestionDraft>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let file: QuestionFile = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    // 空题干没有意义，直接丢弃
    Ok(file
        .questions
        .into_iter()
        .filter(|q| !q.body.trim().is_empty())
        .collect())
}

/// 从文件夹中加载所有 TOML 题目文件
///
/// 文件夹不存在时返回空列表；单个文件解析失败只记录警告。
pub async fn load_question_folder(folder_path: &str) -> Result<Vec<QuestionDraft>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        tracing::warn!("题目文件夹不存在: {}", folder_path);
        return Ok(Vec::new());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    // read_dir 的顺序不固定
    toml_files.sort();

    let mut drafts = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_question_file(&path).await {
            Ok(questions) => {
                tracing::info!("成功加载 {} 个题目", questions.len());
                drafts.extend(questions);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(drafts)
}

/// 加载组卷模板
pub async fn load_template(toml_file_path: &Path) -> Result<ExamTemplate> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取模板文件: {}", toml_file_path.display()))?;

    let template: ExamTemplate = toml::from_str(&content)
        .with_context(|| format!("无法解析模板文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "模板 {} 加载完成: {} 个大题, 共 {} 题",
        template.name,
        template.sections.len(),
        template.total_questions()
    );

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{QuestionPayload, QuestionType};

    const SAMPLE: &str = r#"
[[questions]]
body = "下列哪个是质数？"
marks = 2
question_type = "multiple_choice"
topic = "数论"
[questions.payload]
kind = "options"
options = ["4", "6", "7", "9"]

[[questions]]
body = "   "
question_type = "essay"

[[questions]]
body = "阅读材料并回答问题"
question_type = "structured"
[questions.payload]
kind = "sub_parts"
parts = [{ body = "概括", marks = 2 }, { body = "分析", marks = 3 }]
"#;

    #[tokio::test]
    async fn test_load_question_folder_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("b.toml"), "not = [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let drafts = load_question_folder(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].question_type, QuestionType::MultipleChoice);
        assert!(matches!(
            drafts[0].payload,
            Some(QuestionPayload::Options { ref options }) if options.len() == 4
        ));
    }

    #[tokio::test]
    async fn test_missing_folder_is_empty() {
        let drafts = load_question_folder("/definitely/not/here").await.unwrap();
        assert!(drafts.is_empty());
    }

    #[tokio::test]
    async fn test_load_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("midterm.toml");
        std::fs::write(
            &path,
            r#"
name = "期中考试"
[[sections]]
label = "一、选择题"
question_type = "multiple_choice"
required_count = 10
marks_per_question = 2

[[sections]]
label = "二、论述题"
question_type = "essay"
required_count = 2
marks_per_question = 15
topic_filter = "history"
"#,
        )
        .unwrap();

        let template = load_template(&path).await.unwrap();
        assert_eq!(template.sections.len(), 2);
        assert_eq!(template.total_questions(), 12);
        assert_eq!(template.sections[1].topic_filter.as_deref(), Some("history"));
    }
}
