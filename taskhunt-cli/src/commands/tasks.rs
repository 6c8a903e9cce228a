//! Task commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use comfy_table::Cell;
use taskhunt_sdk::{
    FilterStore, QueryResult, Task, TaskFilters, TaskListItem, DEFAULT_SEARCH_LIMIT,
    MIN_SEARCH_LEN,
};
use tracing::debug;

use crate::context::Context;
use crate::output::{
    difficulty_badge, difficulty_cell, format_minutes, format_number, format_tags,
    format_timestamp, pluralize, pr_state_badge, print_field, print_list_field,
    print_optional_field, print_section, truncate, TableDisplay,
};

const LIST_HEADERS: &[&str] = &[
    "ID", "Benchmark", "Difficulty", "Category", "Author", "Tags", "PR", "Instruction",
];

/// Task browsing commands
#[derive(Debug, Args)]
pub struct TasksCommands {
    #[command(subcommand)]
    pub command: TasksSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum TasksSubcommand {
    /// List tasks matching the given filters
    List(ListArgs),

    /// Show one task in detail
    Get {
        /// Benchmark the task belongs to
        benchmark: String,

        /// Task ID within the benchmark
        task_id: String,
    },

    /// Search tasks by free text
    Search {
        /// Text to search for (at least 2 characters)
        query: String,

        /// Show at most this many results
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(DEFAULT_SEARCH_LIMIT)))]
        limit: Option<u32>,
    },

    /// List tasks contributed through pull requests
    Prs {
        /// Only PR tasks for this benchmark
        #[arg(short, long)]
        benchmark: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter by benchmark
    #[arg(short, long)]
    pub benchmark: Option<String>,

    /// Filter by difficulty
    #[arg(short, long)]
    pub difficulty: Option<String>,

    /// Filter by category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only tasks matching this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Leave out tasks contributed through pull requests
    #[arg(long)]
    pub no_prs: bool,

    /// Maximum number of tasks to return
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Number of tasks to skip
    #[arg(long)]
    pub offset: Option<u32>,
}

impl ListArgs {
    /// Filter store holding the selections given on the command line
    fn filter_store(&self) -> FilterStore {
        let store = FilterStore::new();
        store.set_benchmark(self.benchmark.clone());
        store.set_difficulty(self.difficulty.clone());
        store.set_category(self.category.clone());
        store.set_search(self.search.clone().unwrap_or_default());
        store.set_include_prs(!self.no_prs);
        store
    }

    /// Paging options layered over the store's filters
    fn paging(&self) -> TaskFilters {
        TaskFilters {
            limit: self.limit,
            offset: self.offset,
            ..Default::default()
        }
    }
}

/// Execute task commands
pub async fn execute(ctx: &Context, cmd: TasksCommands) -> Result<()> {
    match cmd.command {
        TasksSubcommand::List(args) => list(ctx, args).await,
        TasksSubcommand::Get { benchmark, task_id } => get(ctx, &benchmark, &task_id).await,
        TasksSubcommand::Search { query, limit } => search(ctx, &query, limit).await,
        TasksSubcommand::Prs { benchmark } => list_prs(ctx, benchmark.as_deref()).await,
    }
}

impl TableDisplay for TaskListItem {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id),
            Cell::new(&self.benchmark_display_name),
            difficulty_cell(self.difficulty.as_deref()),
            Cell::new(self.category.as_deref().unwrap_or("-")),
            Cell::new(self.author_name.as_deref().unwrap_or("-")),
            Cell::new(format_tags(&self.tags)),
            Cell::new(pr_label(self)),
            Cell::new(truncate(&self.instruction_preview, 60)),
        ]
    }

    fn display_single(&self) {
        print_section(&self.id);
        print_field("Benchmark", &self.benchmark_display_name);
        if let Some(difficulty) = &self.difficulty {
            print_field("Difficulty", &difficulty_badge(difficulty));
        }
        print_optional_field("Category", self.category.as_deref());
        print_optional_field("Author", self.author_name.as_deref());
        if self.is_from_pr {
            print_field("Source", &pr_label(self));
        }
        print_field("Preview", &self.instruction_preview);
        print_list_field("Tags", &self.tags);
    }

    fn display_compact(&self) {
        println!(
            "{}/{}\t{}\t{}\t{}",
            self.benchmark,
            self.id,
            self.difficulty.as_deref().unwrap_or("-"),
            self.category.as_deref().unwrap_or("-"),
            pr_label(self)
        );
    }
}

impl TableDisplay for Task {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id),
            Cell::new(&self.benchmark_display_name),
            difficulty_cell(self.metadata.difficulty.as_deref()),
            Cell::new(self.metadata.category.as_deref().unwrap_or("-")),
        ]
    }

    fn display_single(&self) {
        match &self.pr_info {
            Some(pr) => println!("\n{}  {}", self.id.bold(), format!("PR #{}", pr.number).magenta()),
            None => println!("\n{}", self.id.bold()),
        }
        println!("{}", self.benchmark_display_name.dimmed());

        print_section("Instruction");
        for line in self.instruction.lines() {
            println!("  {}", line);
        }

        if let Some(url) = &self.github_url {
            println!();
            print_field("View on GitHub", url);
        }

        let meta = &self.metadata;
        print_section("Details");
        if let Some(difficulty) = &meta.difficulty {
            print_field("Difficulty", &difficulty_badge(difficulty));
        }
        print_optional_field("Category", meta.category.as_deref());
        print_optional_field("Author", meta.author_name.as_deref());
        print_list_field("Tags", &meta.tags);

        if meta.has_time_estimates() {
            print_section("Time Estimates");
            if let Some(minutes) = meta.expert_time_estimate_min {
                print_field("Expert", &format_minutes(minutes));
            }
            if let Some(minutes) = meta.junior_time_estimate_min {
                print_field("Junior", &format_minutes(minutes));
            }
        }

        if let Some(env) = &self.environment {
            print_section("Environment");
            print_optional_field("Docker Image", env.docker_image.as_deref());
            if let Some(cpus) = env.cpus {
                print_field("CPUs", &format_number(cpus));
            }
            print_optional_field("Memory", env.memory.as_deref());
            print_optional_field("Storage", env.storage.as_deref());
            if let Some(secs) = env.build_timeout_sec {
                print_field("Build Timeout", &format!("{}s", format_number(secs)));
            }
        }

        if self.agent_timeout_sec.is_some() || self.verifier_timeout_sec.is_some() {
            print_section("Timeouts");
            if let Some(secs) = self.agent_timeout_sec {
                print_field("Agent", &format!("{}s", format_number(secs)));
            }
            if let Some(secs) = self.verifier_timeout_sec {
                print_field("Verifier", &format!("{}s", format_number(secs)));
            }
        }

        if let Some(pr) = &self.pr_info {
            print_section("Pull Request");
            print_field("Title", &pr.title);
            print_field("Author", &format!("by {}", pr.author));
            print_field("State", &pr_state_badge(&pr.state));
            if let Some(created) = pr.created_at_utc() {
                print_field("Opened", &format_timestamp(&created));
            }
            if let Some(updated) = pr.updated_at_utc() {
                print_field("Updated", &format_timestamp(&updated));
            }
            print_field("View PR", &pr.url);
        }
    }

    fn display_compact(&self) {
        println!(
            "{}/{}\t{}\t{}\t{}",
            self.benchmark,
            self.id,
            self.metadata.difficulty.as_deref().unwrap_or("-"),
            self.metadata.category.as_deref().unwrap_or("-"),
            self.github_url.as_deref().unwrap_or("-")
        );
    }
}

fn pr_label(task: &TaskListItem) -> String {
    match (task.is_from_pr, task.pr_number) {
        (true, Some(number)) => format!("PR #{}", number),
        (true, None) => "PR".to_string(),
        (false, _) => "-".to_string(),
    }
}

/// Turn a failed query into the failure notice plus an error carrying
/// the underlying message.
fn ensure_loaded<T>(ctx: &Context, result: &QueryResult<T>, notice: &str) -> Result<()> {
    if result.is_error() {
        ctx.output.error(notice);
        let message = result
            .error_message()
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(anyhow!(message));
    }
    Ok(())
}

fn render_task_list(ctx: &Context, tasks: &[TaskListItem]) -> Result<()> {
    if ctx.output.is_table() {
        if tasks.is_empty() {
            println!("{}", "No tasks found".bold());
            println!("{}", "Try adjusting your filters or search query".dimmed());
            return Ok(());
        }
        println!("{}", format!("{} found", pluralize(tasks.len(), "task")).dimmed());
    }
    ctx.output.write_list(tasks, LIST_HEADERS)
}

async fn list(ctx: &Context, args: ListArgs) -> Result<()> {
    let queries = ctx.create_queries(args.filter_store())?;

    if ctx.output.is_table() && queries.filters().has_active_filters() {
        let filters = queries.merged_filters(None);
        let active: Vec<String> = [
            ("benchmark", filters.benchmark),
            ("difficulty", filters.difficulty),
            ("category", filters.category),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!("{}={}", name, v)))
        .collect();
        ctx.output.info(&format!("Filters: {}", active.join(" ")));
    }

    let paging = args.paging();
    debug!(key = %queries.tasks_key(Some(&paging)), "Listing tasks");

    let spinner = ctx.output.spinner("Fetching tasks...");
    let result = queries.tasks(Some(&paging)).await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    ensure_loaded(ctx, &result, "Failed to load tasks. Please try again later.")?;
    render_task_list(ctx, result.data().map(Vec::as_slice).unwrap_or_default())
}

async fn get(ctx: &Context, benchmark: &str, task_id: &str) -> Result<()> {
    let queries = ctx.create_queries(FilterStore::new())?;

    let spinner = ctx.output.spinner("Fetching task...");
    let result = queries.task(Some(benchmark), Some(task_id)).await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    if result.is_disabled() {
        anyhow::bail!("Both a benchmark and a task ID are required");
    }
    ensure_loaded(ctx, &result, "Failed to load task.")?;

    match result.data() {
        Some(task) => ctx.output.write(task),
        None => Err(anyhow!("Task {}/{} returned no data", benchmark, task_id)),
    }
}

async fn search(ctx: &Context, query: &str, limit: Option<u32>) -> Result<()> {
    let queries = ctx.create_queries(FilterStore::new())?;

    let spinner = ctx.output.spinner("Searching...");
    let result = queries.search(query).await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    if result.is_disabled() {
        ctx.output.info(&format!(
            "Type at least {} characters to search",
            MIN_SEARCH_LEN
        ));
        return Ok(());
    }
    ensure_loaded(ctx, &result, "Search failed. Please try again later.")?;

    let tasks = result.data().map(Vec::as_slice).unwrap_or_default();
    let shown = limit.map_or(tasks.len(), |n| tasks.len().min(n as usize));
    if shown < tasks.len() {
        debug!(returned = tasks.len(), shown, "Truncating search results");
    }
    render_task_list(ctx, &tasks[..shown])
}

async fn list_prs(ctx: &Context, benchmark: Option<&str>) -> Result<()> {
    let queries = ctx.create_queries(FilterStore::new())?;

    let spinner = ctx.output.spinner("Fetching PR tasks...");
    let result = queries.pr_tasks(benchmark).await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    ensure_loaded(ctx, &result, "Failed to load PR tasks. Please try again later.")?;
    render_task_list(ctx, result.data().map(Vec::as_slice).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(is_from_pr: bool, pr_number: Option<u64>) -> TaskListItem {
        TaskListItem {
            id: "t1".to_string(),
            benchmark: "tb-core".to_string(),
            benchmark_display_name: "Terminal Bench Core".to_string(),
            instruction_preview: "Do the thing".to_string(),
            difficulty: None,
            category: None,
            tags: Vec::new(),
            author_name: None,
            is_from_pr,
            pr_number,
        }
    }

    #[test]
    fn test_pr_label() {
        assert_eq!(pr_label(&item(true, Some(42))), "PR #42");
        assert_eq!(pr_label(&item(true, None)), "PR");
        assert_eq!(pr_label(&item(false, Some(42))), "-");
    }

    #[test]
    fn test_list_args_fill_the_filter_store() {
        let args = ListArgs {
            benchmark: Some("tb-core".to_string()),
            difficulty: None,
            category: Some(String::new()),
            search: Some("grep".to_string()),
            no_prs: true,
            limit: Some(10),
            offset: None,
        };

        let state = args.filter_store().snapshot();
        assert_eq!(state.benchmark.as_deref(), Some("tb-core"));
        assert_eq!(state.category, None);
        assert_eq!(state.search, "grep");
        assert!(!state.include_prs);
        assert_eq!(args.paging(), TaskFilters::new().with_limit(10));
    }
}
