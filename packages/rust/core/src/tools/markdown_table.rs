//! `MarkdownTableTool`: structured records → Markdown table file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use reviewcrew_artifacts::{WriteMode, WrittenArtifact, write_markdown};
use reviewcrew_shared::{Result, Table};

use super::{Tool, parse_args, wrap_bare_data};

const NAME: &str = "MarkdownTableTool";

const DESCRIPTION: &str = "Generates a markdown table from structured data. \
    This tool accepts a list of dictionaries where each dictionary represents a row of data. \
    The keys of the dictionaries should be consistent to ensure proper formatting. \
    Options are available to specify the output file name and whether to append to an \
    existing file or overwrite it. The resulting markdown table will be saved to the specified file.";

#[derive(Debug, Deserialize)]
struct Args {
    data: Value,
    #[serde(default)]
    file_name: Option<PathBuf>,
    #[serde(default)]
    append: bool,
}

/// Renders review records as a Markdown table and saves it.
#[derive(Debug, Clone)]
pub struct MarkdownTableTool {
    default_path: PathBuf,
}

impl MarkdownTableTool {
    /// `default_path` is used when a call doesn't name a file.
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// The table text without touching the filesystem.
    pub fn render(&self, table: &Table) -> String {
        reviewcrew_markdown::render_table(table)
    }

    /// Render and persist. Overwrites unless `append` is set.
    pub fn run(&self, table: &Table, file_name: Option<&Path>, append: bool) -> Result<WrittenArtifact> {
        let path = file_name.unwrap_or(self.default_path.as_path());
        let mode = if append { WriteMode::Append } else { WriteMode::Overwrite };
        debug!(path = %path.display(), rows = table.len(), append, "generating markdown table");

        let written = write_markdown(table, path, mode)?;
        info!(path = %written.path.display(), "Markdown table generated");
        Ok(written)
    }
}

#[async_trait]
impl Tool for MarkdownTableTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Rows of data; each object maps column name to value."
                },
                "file_name": {
                    "type": "string",
                    "description": "Output file. Defaults to the configured markdown path."
                },
                "append": {
                    "type": "boolean",
                    "description": "Append to the file instead of overwriting it.",
                    "default": false
                }
            },
            "required": ["data"]
        })
    }

    async fn call(&self, args: Value) -> Result<String> {
        let args: Args = parse_args(NAME, wrap_bare_data(args))?;
        let table = Table::from_json(&args.data)?;
        let written = self.run(&table, args.file_name.as_deref(), args.append)?;
        Ok(format!(
            "Markdown table generated and saved as {}",
            written.path.display()
        ))
    }
}
