//! Catalog statistics and filter option commands

use anyhow::{anyhow, Result};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, CellAlignment, Color, Table};
use taskhunt_sdk::{FilterOptions, FilterStore, OverallStats};

use crate::context::Context;
use crate::output::{print_field, print_section, TableDisplay};

impl TableDisplay for OverallStats {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.total_tasks),
            Cell::new(self.benchmarks.len()),
            Cell::new(self.total_pr_tasks),
        ]
    }

    fn display_single(&self) {
        print_section("Overview");
        print_field("Total Tasks", &self.total_tasks.to_string());
        print_field("Benchmarks", &self.benchmarks.len().to_string());
        print_field("PR Tasks", &self.total_pr_tasks.to_string());

        if self.benchmarks.is_empty() {
            return;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        let header_cells: Vec<Cell> = ["Benchmark", "Tasks", "By Difficulty"]
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect();
        table.set_header(header_cells);

        for b in &self.benchmarks {
            let breakdown: Vec<String> = b
                .by_difficulty
                .iter()
                .map(|(difficulty, count)| format!("{} {}", difficulty, count))
                .collect();
            table.add_row(vec![
                Cell::new(&b.display_name),
                Cell::new(format!("{} tasks", b.total_tasks)).set_alignment(CellAlignment::Right),
                Cell::new(breakdown.join(", ")),
            ]);
        }

        println!();
        println!("{table}");
    }

    fn display_compact(&self) {
        println!(
            "tasks={}\tbenchmarks={}\tpr_tasks={}",
            self.total_tasks,
            self.benchmarks.len(),
            self.total_pr_tasks
        );
    }
}

impl TableDisplay for FilterOptions {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.benchmarks.len()),
            Cell::new(self.difficulties.len()),
            Cell::new(self.categories.len()),
        ]
    }

    fn display_single(&self) {
        print_section("Benchmark");
        println!("  {}", "All benchmarks".dimmed());
        for b in &self.benchmarks {
            println!("  {} ({}) - {} tasks", b.display_name, b.benchmark, b.total_tasks);
        }

        print_section("Difficulty");
        println!("  {}", "All difficulties".dimmed());
        for d in &self.difficulties {
            println!("  {}", d);
        }

        print_section("Category");
        println!("  {}", "All categories".dimmed());
        for c in &self.categories {
            println!("  {}", c);
        }
    }

    fn display_compact(&self) {
        for b in &self.benchmarks {
            println!("benchmark\t{}", b.benchmark);
        }
        for d in &self.difficulties {
            println!("difficulty\t{}", d);
        }
        for c in &self.categories {
            println!("category\t{}", c);
        }
    }
}

/// Show catalog statistics
pub async fn stats(ctx: &Context) -> Result<()> {
    let queries = ctx.create_queries(FilterStore::new())?;

    let spinner = ctx.output.spinner("Fetching statistics...");
    let result = queries.stats().await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    if result.is_error() {
        ctx.output.error("Failed to load statistics.");
        return Err(anyhow!(result
            .error_message()
            .unwrap_or_else(|| "Unknown error".to_string())));
    }

    match result.data() {
        Some(stats) => ctx.output.write(stats),
        None => Err(anyhow!("Statistics request returned no data")),
    }
}

/// Show the values each filter can take. A failed stats request leaves
/// every list empty rather than failing the command.
pub async fn filters(ctx: &Context) -> Result<()> {
    let queries = ctx.create_queries(FilterStore::new())?;

    let spinner = ctx.output.spinner("Fetching filter options...");
    let result = queries.stats().await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    if let Some(message) = result.error_message() {
        ctx.output
            .warning(&format!("Could not load filter options: {}", message));
    }

    let options = FilterOptions::from_stats(result.data());
    ctx.output.write(&options)
}
