//! `CSVWriterTool`: structured records → CSV file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use reviewcrew_artifacts::{WrittenArtifact, write_csv};
use reviewcrew_shared::{Result, Table};

use super::{Tool, parse_args, wrap_bare_data};

const NAME: &str = "CSVWriterTool";

const DESCRIPTION: &str = "Generates a CSV file from structured data. \
    Accepts a list of dictionaries where each dictionary represents a row of data.";

#[derive(Debug, Deserialize)]
struct Args {
    data: Value,
    #[serde(default)]
    file_name: Option<PathBuf>,
}

/// Writes review records to a CSV file.
#[derive(Debug, Clone)]
pub struct CsvWriterTool {
    default_path: PathBuf,
}

impl CsvWriterTool {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    pub fn run(&self, table: &Table, file_name: Option<&Path>) -> Result<WrittenArtifact> {
        let path = file_name.unwrap_or(self.default_path.as_path());
        debug!(path = %path.display(), rows = table.len(), "generating CSV file");

        let written = write_csv(table, path)?;
        info!(path = %written.path.display(), "CSV file generated");
        Ok(written)
    }
}

#[async_trait]
impl Tool for CsvWriterTool {
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
                    "description": "Output file. Defaults to the configured CSV path."
                }
            },
            "required": ["data"]
        })
    }

    async fn call(&self, args: Value) -> Result<String> {
        let args: Args = parse_args(NAME, wrap_bare_data(args))?;
        let table = Table::from_json(&args.data)?;
        let written = self.run(&table, args.file_name.as_deref())?;
        Ok(format!("CSV file generated and saved as {}", written.path.display()))
    }
}
