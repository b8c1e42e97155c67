//! CLI 配置
//!
//! 包含 CLI 特有的配置：分阶段日志级别和可选的 JSON 项目文件

use modpack_config::{Dialect, HookPolicy, Layout, Phase};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub walk: Option<Level>,
    pub emit: Option<Level>,
    pub read: Option<Level>,
    pub resolve: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            walk: None,
            emit: None,
            read: None,
            resolve: None,
        }
    }
}

impl LogConfig {
    /// 获取指定阶段的日志级别
    pub fn level_for(&self, phase: Phase) -> Level {
        let level = match phase {
            Phase::Walk => self.walk,
            Phase::Emit => self.emit,
            Phase::Read => self.read,
            Phase::Resolve => self.resolve,
        };
        level.unwrap_or(self.global)
    }

    /// Apply the project file's `log` section; unknown level names are ignored
    pub fn apply(&mut self, section: &LogSection) {
        if let Some(level) = section.level.as_deref().and_then(parse_log_level) {
            self.global = level;
        }
        let phase_level = |value: &Option<String>| value.as_deref().and_then(parse_log_level);
        self.walk = phase_level(&section.walk).or(self.walk);
        self.emit = phase_level(&section.emit).or(self.emit);
        self.read = phase_level(&section.read).or(self.read);
        self.resolve = phase_level(&section.resolve).or(self.resolve);
    }
}

/// 解析日志级别字符串
pub fn parse_log_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "silent" => Some(Level::ERROR), // silent = 只显示错误
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// `log` section of the project file
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: Option<String>,
    pub walk: Option<String>,
    pub emit: Option<String>,
    pub read: Option<String>,
    pub resolve: Option<String>,
}

/// modpack.json 结构
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    pub layout: Layout,
    pub dialect: Dialect,
    /// Carrier template, relative to the project file
    pub carrier: Option<PathBuf>,
    pub tag: bool,
    pub warn_ignored: bool,
    pub hook: HookPolicy,
    pub log: LogSection,
}

impl ProjectFile {
    /// Read and parse a project file
    pub fn read(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;

        let mut project: ProjectFile = serde_json::from_str(&content)
            .map_err(|e| format!("cannot parse '{}': {}", path.display(), e))?;

        if let Some(carrier) = project.carrier.take() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            project.carrier = Some(base_dir.join(carrier));
        }

        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_level_for_falls_back_to_global() {
        let config = LogConfig {
            global: Level::WARN,
            walk: Some(Level::TRACE),
            ..LogConfig::default()
        };
        assert_eq!(config.level_for(Phase::Walk), Level::TRACE);
        assert_eq!(config.level_for(Phase::Emit), Level::WARN);
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_log_level("silent"), Some(Level::ERROR));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_apply_log_section() {
        let mut config = LogConfig::default();
        config.apply(&LogSection {
            level: Some("warn".to_string()),
            resolve: Some("trace".to_string()),
            walk: Some("nonsense".to_string()),
            ..LogSection::default()
        });
        assert_eq!(config.global, Level::WARN);
        assert_eq!(config.resolve, Some(Level::TRACE));
        assert_eq!(config.walk, None);
    }

    #[test]
    fn test_read_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modpack.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"carrier": "wrap.template", "tag": true, "layout": {{"source_extension": "lua", "marker_stem": "init"}}}}"#
        )
        .unwrap();

        let project = ProjectFile::read(&path).unwrap();
        assert!(project.tag);
        assert!(!project.warn_ignored);
        assert_eq!(project.hook, HookPolicy::Auto);
        assert_eq!(project.layout.marker_file_name(), "init.lua");
        assert_eq!(project.carrier, Some(dir.path().join("wrap.template")));
    }

    #[test]
    fn test_missing_project_file() {
        let err = ProjectFile::read(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.contains("cannot read"));
    }
}
