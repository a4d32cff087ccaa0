//! Declarative crew plan: two agents, three sequential tasks.
//!
//! The plan is data. An agent framework consumes it through
//! [`AgentBackend`](crate::run::AgentBackend); nothing here talks to a model.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use reviewcrew_shared::{Result, ReviewCrewError, RunConfig};

use crate::tools::ToolSet;

pub const DATA_COLLECTOR: &str = "Data Collector";
pub const DATA_ANALYZER: &str = "Data Analyzer";

pub const COLLECT_REVIEWS: &str = "collect_reviews";
pub const ANALYZE_MARKDOWN: &str = "analyze_reviews_markdown";
pub const ANALYZE_CSV: &str = "analyze_reviews_csv";

/// Search tools supplied by the agent framework, not by this workspace.
pub const EXTERNAL_TOOLS: &[&str] = &["SerperDevTool", "EXASearchTool"];

/// How tasks are ordered. Only sequential runs are defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    #[default]
    Sequential,
}

/// An agent role with its goal and tool names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<String>,
    #[serde(default)]
    pub verbose: bool,
}

/// A unit of work assigned to one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    /// Role of the agent that performs the task.
    pub agent: String,
    /// Tools for this task. When empty the agent's own tools apply.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Names of earlier tasks whose output this task receives.
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
}

/// The full crew: agents, tasks, and process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewPlan {
    pub agents: Vec<AgentSpec>,
    pub tasks: Vec<TaskSpec>,
    #[serde(default)]
    pub process: Process,
}

impl CrewPlan {
    /// Build the review crew for one product category.
    #[instrument(skip_all, fields(product = %config.product_type))]
    pub fn for_run(config: &RunConfig) -> Self {
        let RunConfig {
            product_type: product,
            review_attributes: attributes,
            source_hints: hints,
            avoid_types: avoid,
            markdown_output,
            csv_output,
        } = config;

        let collector = AgentSpec {
            role: DATA_COLLECTOR.into(),
            goal: format!(
                "Collect product reviews for the top {product}, including {attributes}. \
                 Be sure to avoid {avoid}"
            ),
            backstory: "An efficient agent focused on gathering relevant data from various \
                        sources. Use all your tools"
                .into(),
            tools: vec![
                "SerperDevTool".into(),
                "EXASearchTool".into(),
                "ScrapeWebsiteTool".into(),
            ],
            verbose: true,
        };

        let analyzer = AgentSpec {
            role: DATA_ANALYZER.into(),
            goal: format!(
                "Analyze collected reviews and generate markdown and CSV outputs for {product}, \
                 including {attributes}. Be sure to avoid {avoid}"
            ),
            backstory: "A detail-oriented agent responsible for analyzing data and creating \
                        structured outputs."
                .into(),
            tools: vec!["MarkdownTableTool".into(), "CSVWriterTool".into()],
            verbose: true,
        };

        let tasks = vec![
            TaskSpec {
                name: COLLECT_REVIEWS.into(),
                description: format!(
                    "Collect product reviews for the top {product}, including {attributes}. \
                     Use these type of {hints}"
                ),
                expected_output: "A JSON object containing the collected reviews.".into(),
                agent: DATA_COLLECTOR.into(),
                tools: vec!["ScrapeWebsiteTool".into()],
                context: vec![],
                output_file: None,
            },
            TaskSpec {
                name: ANALYZE_MARKDOWN.into(),
                description: format!(
                    "Analyze collected reviews and generate a markdown table for {product}, \
                     including {attributes}. Be sure to avoid {avoid}"
                ),
                expected_output: format!(
                    "A markdown table saved to {}.",
                    markdown_output.display()
                ),
                agent: DATA_ANALYZER.into(),
                tools: vec!["MarkdownTableTool".into()],
                context: vec![COLLECT_REVIEWS.into()],
                output_file: Some(markdown_output.clone()),
            },
            TaskSpec {
                name: ANALYZE_CSV.into(),
                description: format!(
                    "Analyze collected reviews of {product}, including {attributes}. \
                     Be sure to avoid {avoid} and generate a CSV file."
                ),
                expected_output: format!("A CSV file saved to {}.", csv_output.display()),
                agent: DATA_ANALYZER.into(),
                tools: vec!["CSVWriterTool".into()],
                context: vec![COLLECT_REVIEWS.into()],
                output_file: Some(csv_output.clone()),
            },
        ];

        info!(agents = 2, tasks = tasks.len(), "crew plan built");

        Self {
            agents: vec![collector, analyzer],
            tasks,
            process: Process::Sequential,
        }
    }

    pub fn agent(&self, role: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.role == role)
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Tool names a task may use: its own list, else its agent's.
    pub fn tools_for(&self, task: &TaskSpec) -> Vec<String> {
        if !task.tools.is_empty() {
            return task.tools.clone();
        }
        self.agent(&task.agent)
            .map(|a| a.tools.clone())
            .unwrap_or_default()
    }

    /// Check the plan is runnable with `tools`.
    ///
    /// Every task names a known agent, context only points at earlier tasks,
    /// and every tool is either in `tools` or supplied by the framework.
    pub fn validate(&self, tools: &ToolSet) -> Result<()> {
        let mut earlier: HashSet<&str> = HashSet::new();

        for task in &self.tasks {
            let agent = self.agent(&task.agent).ok_or_else(|| {
                ReviewCrewError::validation(format!(
                    "task '{}' refers to unknown agent '{}'",
                    task.name, task.agent
                ))
            })?;

            if let Some(missing) = task.context.iter().find(|c| !earlier.contains(c.as_str())) {
                return Err(ReviewCrewError::validation(format!(
                    "task '{}' needs context from '{missing}', which does not run before it",
                    task.name
                )));
            }

            for tool in agent.tools.iter().chain(&task.tools) {
                if !tools.contains(tool) && !EXTERNAL_TOOLS.contains(&tool.as_str()) {
                    return Err(ReviewCrewError::validation(format!(
                        "task '{}' uses unknown tool '{tool}'",
                        task.name
                    )));
                }
            }

            if !earlier.insert(&task.name) {
                return Err(ReviewCrewError::validation(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }
        }

        Ok(())
    }
}
