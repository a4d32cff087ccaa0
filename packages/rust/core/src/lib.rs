//! Crew plan, agent tools, and run orchestration for ReviewCrew.
//!
//! This crate ties the formatting tools, the counting scraper, and the
//! declarative crew plan together. Model reasoning and search live behind
//! [`run::AgentBackend`], supplied by an agent framework.

pub mod crew;
pub mod run;
pub mod tools;

pub use crew::{AgentSpec, CrewPlan, Process, TaskSpec};
pub use run::{AgentBackend, Crew, RunContext, RunReport, TaskOutput};
pub use tools::{CsvWriterTool, MarkdownTableTool, ScrapeWebsiteTool, Tool, ToolDefinition, ToolSet};
