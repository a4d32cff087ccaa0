//! Run context, agent-framework seam, and sequential kickoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument};

use reviewcrew_crawler::{CountingScraper, Scraper, SourceCounter};
use reviewcrew_shared::{Result, ReviewCrewError, RunConfig, RunId};

use crate::crew::{AgentSpec, CrewPlan, TaskSpec};
use crate::tools::{CsvWriterTool, MarkdownTableTool, ScrapeWebsiteTool, ToolSet};

/// Per-run state: identity and the source counter.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: RunId,
    counter: SourceCounter,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            counter: SourceCounter::new(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn counter(&self) -> &SourceCounter {
        &self.counter
    }

    /// Successful scrapes so far in this run.
    pub fn total_sources(&self) -> usize {
        self.counter.get()
    }

    /// Wrap a scraper so its successes count toward this run.
    pub fn counting<S: Scraper>(&self, inner: S) -> CountingScraper<S> {
        CountingScraper::new(inner, self.counter.clone())
    }

    /// The workspace's tools for a run, with scraping counted by this context.
    pub fn toolset<S: Scraper + 'static>(&self, config: &RunConfig, scraper: S) -> ToolSet {
        ToolSet::new()
            .with(ScrapeWebsiteTool::new(Arc::new(self.counting(scraper))))
            .with(MarkdownTableTool::new(&config.markdown_output))
            .with(CsvWriterTool::new(&config.csv_output))
    }
}

/// Output of one finished task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    pub task: String,
    pub agent: String,
    pub raw: String,
}

/// The agent framework seam: perform one task as one agent.
///
/// Implementations own prompting, model calls, and the tool-calling loop.
/// `tools` holds only what the task may use; `context` holds the outputs of
/// the tasks named in [`TaskSpec::context`], in plan order.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn execute(
        &self,
        agent: &AgentSpec,
        task: &TaskSpec,
        context: &[TaskOutput],
        tools: &ToolSet,
    ) -> Result<String>;
}

/// End-of-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub product_type: String,
    pub total_sources: usize,
    pub elapsed: Duration,
    pub outputs: Vec<TaskOutput>,
}

impl RunReport {
    /// Output of the last task, which is what a crew run "returns".
    pub fn final_output(&self) -> Option<&str> {
        self.outputs.last().map(|o| o.raw.as_str())
    }
}

/// A plan bound to its tools and run context.
pub struct Crew {
    plan: CrewPlan,
    tools: ToolSet,
    ctx: RunContext,
    product_type: String,
}

impl Crew {
    /// Bind a plan to tools. Fails if the plan references unknown agents or tools.
    pub fn new(config: &RunConfig, plan: CrewPlan, tools: ToolSet, ctx: RunContext) -> Result<Self> {
        plan.validate(&tools)?;
        Ok(Self {
            plan,
            tools,
            ctx,
            product_type: config.product_type.clone(),
        })
    }

    pub fn plan(&self) -> &CrewPlan {
        &self.plan
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Run every task in order. The first failing task ends the run.
    #[instrument(skip_all, fields(run_id = %self.ctx.run_id(), product = %self.product_type))]
    pub async fn kickoff(&self, backend: &dyn AgentBackend) -> Result<RunReport> {
        let started = Instant::now();
        info!(tasks = self.plan.tasks.len(), "starting crew");
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.plan.tasks.len());

        for task in &self.plan.tasks {
            let agent = self.plan.agent(&task.agent).ok_or_else(|| {
                ReviewCrewError::validation(format!("unknown agent '{}'", task.agent))
            })?;

            let context: Vec<TaskOutput> = outputs
                .iter()
                .filter(|o| task.context.contains(&o.task))
                .cloned()
                .collect();
            let tools = self.tools.subset(&self.plan.tools_for(task));

            info!(task = %task.name, agent = %agent.role, tools = ?tools.names(), "running task");
            let raw = backend.execute(agent, task, &context, &tools).await?;

            outputs.push(TaskOutput {
                task: task.name.clone(),
                agent: agent.role.clone(),
                raw,
            });
        }

        let report = RunReport {
            run_id: self.ctx.run_id().clone(),
            product_type: self.product_type.clone(),
            total_sources: self.ctx.total_sources(),
            elapsed: started.elapsed(),
            outputs,
        };

        info!(
            total_sources = report.total_sources,
            elapsed_ms = report.elapsed.as_millis(),
            "crew kickoff completed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::{ANALYZE_CSV, ANALYZE_MARKDOWN, COLLECT_REVIEWS};
    use chrono::Utc;
    use reviewcrew_crawler::ScrapedPage;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use url::Url;

    struct FakeScraper;

    #[async_trait]
    impl Scraper for FakeScraper {
        async fn scrape(&self, url: &Url) -> Result<ScrapedPage> {
            if url.host_str() == Some("down.example") {
                return Err(ReviewCrewError::upstream("HTTP 503"));
            }
            Ok(ScrapedPage {
                url: url.to_string(),
                status_code: 200,
                title: None,
                markdown: format!("review text from {url}\n"),
                content_hash: String::new(),
                fetched_at: Utc::now(),
                truncated: false,
            })
        }
    }

    /// Scripted backend: the collector scrapes, analyzers call their one tool.
    struct ScriptedBackend {
        seen_context: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                seen_context: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AgentBackend for ScriptedBackend {
        async fn execute(
            &self,
            _agent: &AgentSpec,
            task: &TaskSpec,
            context: &[TaskOutput],
            tools: &ToolSet,
        ) -> Result<String> {
            self.seen_context.lock().unwrap().push((
                task.name.clone(),
                context.iter().map(|c| c.task.clone()).collect(),
            ));

            match task.name.as_str() {
                COLLECT_REVIEWS => {
                    for site in ["https://a.example/r", "https://b.example/r", "https://down.example/r"] {
                        let _ = tools.call("ScrapeWebsiteTool", json!({"website_url": site})).await;
                    }
                    Ok(json!([
                        {"name": "RAXE300", "rating": "4.5", "url": "https://a.example/r"},
                        {"name": "RAXE500", "url": "https://b.example/r"}
                    ])
                    .to_string())
                }
                ANALYZE_MARKDOWN => tools.call("MarkdownTableTool", json!(context[0].raw)).await,
                ANALYZE_CSV => tools.call("CSVWriterTool", json!(context[0].raw)).await,
                other => Err(ReviewCrewError::validation(format!("unexpected task {other}"))),
            }
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl AgentBackend for FailingBackend {
        async fn execute(
            &self,
            _agent: &AgentSpec,
            _task: &TaskSpec,
            _context: &[TaskOutput],
            _tools: &ToolSet,
        ) -> Result<String> {
            Err(ReviewCrewError::upstream("model unavailable"))
        }
    }

    fn run_config(dir: &std::path::Path) -> RunConfig {
        RunConfig {
            product_type: "routers".into(),
            review_attributes: "price, ratings".into(),
            source_hints: "tech review sites".into(),
            avoid_types: "mesh kits".into(),
            markdown_output: dir.join("router_review.md"),
            csv_output: dir.join("router_review.csv"),
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rc-run-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn crew(config: &RunConfig) -> Crew {
        let ctx = RunContext::new();
        let tools = ctx.toolset(config, FakeScraper);
        Crew::new(config, CrewPlan::for_run(config), tools, ctx).unwrap()
    }

    #[tokio::test]
    async fn kickoff_runs_tasks_in_order_and_writes_outputs() {
        let dir = temp_dir();
        let config = run_config(&dir);
        let crew = crew(&config);
        let backend = ScriptedBackend::new();

        let report = crew.kickoff(&backend).await.unwrap();

        assert_eq!(report.outputs.len(), 3);
        assert_eq!(report.total_sources, 2);
        assert_eq!(report.product_type, "routers");
        assert_eq!(
            report.final_output().unwrap(),
            format!("CSV file generated and saved as {}", config.csv_output.display())
        );

        let seen = backend.seen_context.lock().unwrap().clone();
        assert_eq!(seen[0], (COLLECT_REVIEWS.to_string(), vec![]));
        assert_eq!(seen[1], (ANALYZE_MARKDOWN.to_string(), vec![COLLECT_REVIEWS.to_string()]));
        assert_eq!(seen[2], (ANALYZE_CSV.to_string(), vec![COLLECT_REVIEWS.to_string()]));

        let md = std::fs::read_to_string(&config.markdown_output).unwrap();
        assert!(md.starts_with("| name | rating | url |\n"));
        let csv = std::fs::read_to_string(&config.csv_output).unwrap();
        assert_eq!(
            csv,
            "name,rating,url\nRAXE300,4.5,https://a.example/r\nRAXE500,,https://b.example/r\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn tasks_only_see_their_own_tools() {
        struct ToolProbe(Mutex<Vec<Vec<String>>>);

        #[async_trait]
        impl AgentBackend for ToolProbe {
            async fn execute(
                &self,
                _agent: &AgentSpec,
                _task: &TaskSpec,
                _context: &[TaskOutput],
                tools: &ToolSet,
            ) -> Result<String> {
                let names = tools.names().into_iter().map(String::from).collect();
                self.0.lock().unwrap().push(names);
                Ok(String::new())
            }
        }

        let dir = temp_dir();
        let probe = ToolProbe(Mutex::new(Vec::new()));
        crew(&run_config(&dir)).kickoff(&probe).await.unwrap();

        let seen = probe.0.lock().unwrap().clone();
        assert_eq!(seen[0], vec!["ScrapeWebsiteTool".to_string()]);
        assert_eq!(seen[1], vec!["MarkdownTableTool".to_string()]);
        assert_eq!(seen[2], vec!["CSVWriterTool".to_string()]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn backend_failure_stops_the_run() {
        let dir = temp_dir();
        let err = crew(&run_config(&dir)).kickoff(&FailingBackend).await.unwrap_err();
        assert!(err.is_upstream());
        assert!(!dir.join("router_review.md").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn elapsed_covers_kickoff_only() {
        let dir = temp_dir();
        let crew = crew(&run_config(&dir));
        std::thread::sleep(Duration::from_millis(300));

        struct NoopBackend;

        #[async_trait]
        impl AgentBackend for NoopBackend {
            async fn execute(
                &self,
                _agent: &AgentSpec,
                _task: &TaskSpec,
                _context: &[TaskOutput],
                _tools: &ToolSet,
            ) -> Result<String> {
                Ok(String::new())
            }
        }

        let report = crew.kickoff(&NoopBackend).await.unwrap();
        assert!(report.elapsed < Duration::from_millis(300), "{:?}", report.elapsed);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn run_context_counter_is_shared_with_scrapers() {
        let ctx = RunContext::new();
        let scraper = ctx.counting(FakeScraper);
        scraper.counter().increment();
        assert_eq!(ctx.total_sources(), 1);
    }
}
