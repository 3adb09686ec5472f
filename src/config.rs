use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::bank::Category;
use crate::session::PracticeOrder;

/// Length, time limit (minutes) and pass mark of a mock exam.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRule {
    pub total: usize,
    pub time: u64,
    pub pass: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamConfig {
    #[serde(default = "default_rule_a")]
    pub a: ExamRule,
    #[serde(default = "default_rule_b")]
    pub b: ExamRule,
    #[serde(default = "default_rule_c")]
    pub c: ExamRule,
}

fn default_rule_a() -> ExamRule {
    ExamRule {
        total: 40,
        time: 40,
        pass: 30,
    }
}
fn default_rule_b() -> ExamRule {
    ExamRule {
        total: 60,
        time: 60,
        pass: 45,
    }
}
fn default_rule_c() -> ExamRule {
    ExamRule {
        total: 90,
        time: 90,
        pass: 70,
    }
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            a: default_rule_a(),
            b: default_rule_b(),
            c: default_rule_c(),
        }
    }
}

impl ExamConfig {
    pub fn rule(&self, category: Category) -> &ExamRule {
        match category {
            Category::A => &self.a,
            Category::B => &self.b,
            Category::C => &self.c,
        }
    }

    fn rule_mut(&mut self, category: Category) -> &mut ExamRule {
        match category {
            Category::A => &mut self.a,
            Category::B => &mut self.b,
            Category::C => &mut self.c,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_url: Option<String>,
    #[serde(default = "default_order")]
    pub default_order: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub exam: ExamConfig,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hamexam")
        .to_string_lossy()
        .to_string()
}
fn default_order() -> String {
    "asc".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            data_dir: default_data_dir(),
            bank_dir: None,
            bank_url: None,
            default_order: default_order(),
            log_level: default_log_level(),
            exam: ExamConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hamexam")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn practice_order(&self) -> PracticeOrder {
        self.default_order.parse().unwrap_or(PracticeOrder::Asc)
    }

    /// Clamp out-of-range values after deserialization: every exam has at
    /// least one question and one minute, and the pass mark never exceeds the length.
    pub fn validate(&mut self, valid_themes: &[String]) {
        for category in Category::ALL {
            let rule = self.exam.rule_mut(category);
            rule.total = rule.total.max(1);
            rule.time = rule.time.max(1);
            rule.pass = rule.pass.min(rule.total);
        }
        if self.default_order.parse::<PracticeOrder>().is_err() {
            self.default_order = default_order();
        }
        if !valid_themes.is_empty() && !valid_themes.iter().any(|t| *t == self.theme) {
            self.theme = default_theme();
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.exam, ExamConfig::default());
        assert_eq!(config.exam.rule(Category::A).total, 40);
        assert_eq!(config.exam.rule(Category::B).time, 60);
        assert_eq!(config.exam.rule(Category::C).pass, 70);
        assert!(config.bank_dir.is_none());
        assert!(config.data_dir.contains("hamexam"));
    }

    #[test]
    fn test_config_partial_exam_table() {
        let toml_str = r#"
theme = "amber"

[exam.b]
total = 10
time = 5
pass = 8
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "amber");
        assert_eq!(
            *config.exam.rule(Category::B),
            ExamRule {
                total: 10,
                time: 5,
                pass: 8
            }
        );
        assert_eq!(*config.exam.rule(Category::A), default_rule_a());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.bank_url = Some("https://example.org/banks".to_string());
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.exam, deserialized.exam);
        assert_eq!(config.bank_url, deserialized.bank_url);
        assert_eq!(config.data_dir, deserialized.data_dir);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.exam.a = ExamRule {
            total: 0,
            time: 0,
            pass: 50,
        };
        config.default_order = "sideways".to_string();
        config.theme = "missing".to_string();

        config.validate(&["terminal-default".to_string(), "amber".to_string()]);

        assert_eq!(
            config.exam.a,
            ExamRule {
                total: 1,
                time: 1,
                pass: 1
            }
        );
        assert_eq!(config.practice_order(), PracticeOrder::Asc);
        assert_eq!(config.theme, "terminal-default");
    }

    #[test]
    fn test_validate_keeps_valid_values() {
        let mut config = Config::default();
        config.default_order = "random".to_string();
        config.theme = "amber".to_string();
        config.validate(&["terminal-default".to_string(), "amber".to_string()]);
        assert_eq!(config.practice_order(), PracticeOrder::Random);
        assert_eq!(config.theme, "amber");
        assert_eq!(config.exam, ExamConfig::default());
    }
}
