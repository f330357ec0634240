//! Crawler that shells out to an external crawl tool.
//!
//! The tool is run once per job as
//!
//! ```text
//! <program> crawl <source> -a city=<location> -a search_task_id=<group>
//!     -a individual_task_id=<job> [-a price=..] [-a rating=..]
//!     -a checkin=YYYY-MM-DD [-a <location_code_arg>=..]
//!     -o -:jsonlines <extra args>
//! ```
//!
//! Items are read from stdout one JSON object per line and forwarded while
//! the tool is still running. Stderr is collected for error reports.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::error::RunnerError;
use super::jobs::JobDescriptor;
use super::traits::BaseCrawler;
use crate::domains::hotels::models::{ScrapedHotel, SourceConfig};

/// Keep error messages readable when a tool dumps a traceback.
const STDERR_TAIL_CHARS: usize = 4000;

/// How to launch the crawl tool.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub program: String,
    /// Directory the tool runs in (the crawl project root).
    pub working_dir: PathBuf,
    /// Appended after the generated arguments.
    pub extra_args: Vec<String>,
    pub timeout: Duration,
}

pub struct ProcessCrawler {
    config: CrawlConfig,
    location_code_args: HashMap<String, String>,
}

impl ProcessCrawler {
    pub fn new(config: CrawlConfig, sources: &[SourceConfig]) -> Self {
        let location_code_args = sources
            .iter()
            .filter_map(|source| {
                source
                    .location_code_arg
                    .clone()
                    .map(|arg| (source.name.clone(), arg))
            })
            .collect();

        Self {
            config,
            location_code_args,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Command-line arguments for one job, not including the program.
    pub fn build_args(&self, descriptor: &JobDescriptor) -> Vec<String> {
        let query = &descriptor.query;
        let mut args = vec![
            "crawl".to_string(),
            descriptor.source_name.clone(),
            "-a".to_string(),
            format!("city={}", query.location),
            "-a".to_string(),
            format!("search_task_id={}", descriptor.group_id),
            "-a".to_string(),
            format!("individual_task_id={}", descriptor.job_id),
        ];

        if let Some(price) = &query.price_ceiling {
            args.push("-a".to_string());
            args.push(format!("price={}", price));
        }
        if let Some(rating) = query.min_rating {
            args.push("-a".to_string());
            args.push(format!("rating={}", rating));
        }

        args.push("-a".to_string());
        args.push(format!("checkin={}", query.check_in.format("%Y-%m-%d")));

        if let (Some(arg), Some(code)) = (
            self.location_code_args.get(&descriptor.source_name),
            &query.location_code,
        ) {
            args.push("-a".to_string());
            args.push(format!("{}={}", arg, code));
        }

        args.push("-o".to_string());
        args.push("-:jsonlines".to_string());
        args.extend(self.config.extra_args.iter().cloned());
        args
    }

    async fn ensure_working_dir(&self) -> Result<(), RunnerError> {
        match tokio::fs::metadata(&self.config.working_dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(RunnerError::MissingWorkingDir {
                path: self.config.working_dir.display().to_string(),
            }),
        }
    }
}

/// Parse one line of crawl output. Blank lines yield `None`.
pub fn parse_output_line(line_no: usize, line: &str) -> Result<Option<ScrapedHotel>, RunnerError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| RunnerError::MalformedOutput {
            line: line_no,
            reason: e.to_string(),
        })
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.trim_end().to_string();
    }
    let skipped: String = text.chars().skip(count - max_chars).collect();
    format!("...{}", skipped.trim_end())
}

#[async_trait]
impl BaseCrawler for ProcessCrawler {
    async fn crawl(
        &self,
        descriptor: &JobDescriptor,
        items: mpsc::Sender<ScrapedHotel>,
    ) -> Result<(), RunnerError> {
        self.ensure_working_dir().await?;

        let args = self.build_args(descriptor);
        info!(
            job_id = %descriptor.job_id,
            source = %descriptor.source_name,
            program = %self.config.program,
            "starting crawl"
        );
        debug!(args = ?args, "crawl arguments");

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RunnerError::ToolNotFound {
                        program: self.config.program.clone(),
                        source: e,
                    }
                } else {
                    RunnerError::Spawn {
                        program: self.config.program.clone(),
                        source: e,
                    }
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Other("crawl process has no stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::Other("crawl process has no stderr".to_string()))?;

        // Drained on its own task so a chatty tool cannot block on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });
        let stderr_abort = stderr_task.abort_handle();

        let run = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut line_no = 0;
            let mut forwarded = 0usize;

            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| RunnerError::Other(format!("failed to read crawl output: {}", e)))?
            {
                line_no += 1;
                if let Some(item) = parse_output_line(line_no, &line)? {
                    if items.send(item).await.is_err() {
                        warn!(job_id = %descriptor.job_id, "item receiver dropped, discarding crawl output");
                        break;
                    }
                    forwarded += 1;
                }
            }

            let status = child.wait().await.map_err(|e| RunnerError::Spawn {
                program: self.config.program.clone(),
                source: e,
            })?;

            // Stderr stays open while anything the tool left running holds it
            let stderr = stderr_task.await.unwrap_or_default();
            Ok::<_, RunnerError>((status, forwarded, stderr))
        };

        let result = tokio::time::timeout(self.config.timeout, run).await;
        stderr_abort.abort();

        let (status, forwarded, stderr) = match result {
            Ok(result) => result?,
            Err(_) => {
                return Err(RunnerError::Timeout {
                    source_name: descriptor.source_name.clone(),
                    timeout: self.config.timeout,
                });
            }
        };

        if !status.success() {
            return Err(RunnerError::NonZeroExit {
                source_name: descriptor.source_name.clone(),
                status: status.to_string(),
                stderr: tail(&stderr, STDERR_TAIL_CHARS),
            });
        }

        info!(
            job_id = %descriptor.job_id,
            source = %descriptor.source_name,
            items = forwarded,
            "crawl finished"
        );
        Ok(())
    }
}
