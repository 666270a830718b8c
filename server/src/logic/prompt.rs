use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Fixed parts of every prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrompt {
    pub subject: String,
    pub modification: String,
    pub integration: String,
    pub posture: String,
}

/// Prompt template as stored in `prompts.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub base_prompt: BasePrompt,
    pub activities: Vec<String>,
}

impl PromptTemplate {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::TemplateIo {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&content)
    }

    /// Unknown keys are ignored.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let template: PromptTemplate = serde_yaml::from_str(yaml)?;
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.activities.is_empty() {
            return Err(ConfigError::NoActivities);
        }
        Ok(())
    }
}

/// Fills the template with one randomly chosen activity.
#[derive(Debug, Clone)]
pub struct PromptGenerator {
    template: PromptTemplate,
}

impl PromptGenerator {
    pub fn new(template: PromptTemplate) -> Result<Self, ConfigError> {
        template.validate()?;
        Ok(Self { template })
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn generate(&self) -> Result<String, ConfigError> {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Same as [`generate`](Self::generate) but draws from the given source.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, ConfigError> {
        let activity = self
            .template
            .activities
            .choose(rng)
            .ok_or(ConfigError::NoActivities)?;

        Ok(self.render(activity))
    }

    pub fn render(&self, activity: &str) -> String {
        let base = &self.template.base_prompt;
        format!(
            "{} {}, {}. {}. {}.",
            base.subject, base.modification, activity, base.integration, base.posture
        )
    }
}
