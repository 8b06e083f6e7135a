use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use degreeplan::{Course, Requirement, Workspace};
use tracing::instrument;

use super::terminal::{Colorize, status_icon};

#[derive(Debug, Parser)]
#[command(about = "Display detailed information about a requirement")]
pub struct Show {
    /// The id of the requirement to display
    id: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// Maximum number of candidate courses and combinations to list
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;

        let Some(requirement) = workspace.catalog().requirement(&self.id) else {
            anyhow::bail!("Requirement '{}' not found", self.id);
        };

        let planned = if workspace.plan().is_some() {
            workspace.planned_courses()?
        } else {
            Vec::new()
        };

        match self.output {
            OutputFormat::Pretty => self.output_pretty(&workspace, requirement, &planned),
            OutputFormat::Json => self.output_json(&workspace, requirement, &planned)?,
        }

        Ok(())
    }

    fn candidates<'a>(workspace: &'a Workspace, requirement: &Requirement) -> Vec<&'a Course> {
        workspace
            .courses()
            .iter()
            .filter(|course| requirement.can_fulfill(course))
            .collect()
    }

    fn output_pretty(&self, workspace: &Workspace, requirement: &Requirement, planned: &[Course]) {
        println!("# {}", requirement.id());
        println!("{}\n", requirement.name());

        println!("{}", "Metadata".dim());
        if let Some(goal) = workspace.catalog().goal_of(requirement.id()) {
            println!("  Goal:      {} ({})", goal.name(), goal.id());
        }
        if let Some(plan) = workspace.plan() {
            let map = workspace
                .evaluator()
                .evaluate(planned, &plan.manually_fulfilled);
            let status = map.status(requirement);
            let manual = if map.is_manual(requirement) {
                " (manual)"
            } else {
                ""
            };
            println!(
                "  Status:    {} {status}{manual}",
                status_icon(status).status(status)
            );
        }

        println!("\n{}", "Description".dim());
        for line in requirement.to_string().lines() {
            println!("  {line}");
        }
        if let Some(annotation) = requirement.annotation() {
            println!("\n{}", "Note".dim());
            for line in annotation.lines() {
                println!("  {line}");
            }
        }

        if let Requirement::Mutex(mutex) = requirement {
            let best = mutex.max_fulfilled(planned);
            let assignments: Vec<_> = mutex
                .fulfillment_mappings(planned)
                .into_iter()
                .filter(|mapping| mapping.iter().flatten().count() == best)
                .collect();
            if best > 0 {
                println!("\n{}", "Best assignments of planned courses".dim());
                for mapping in assignments.iter().take(self.limit) {
                    let slots: Vec<String> = mutex
                        .requirements()
                        .iter()
                        .zip(mapping)
                        .map(|(child, &course)| {
                            let course = course.map_or_else(|| "-".to_string(), Course::code);
                            format!("{} <- {course}", child.id())
                        })
                        .collect();
                    println!("  • {}", slots.join(", "));
                }
            }
        }

        let candidates = Self::candidates(workspace, requirement);
        if !candidates.is_empty() {
            println!("\n{}", "Courses that can contribute".dim());
            for &course in candidates.iter().take(self.limit) {
                let marker = if planned.contains(course) {
                    "*".success()
                } else {
                    " ".to_string()
                };
                println!("  {marker} {:<14} {}", course.code(), course.title());
            }
            if candidates.len() > self.limit {
                println!("  ... and {} more", candidates.len() - self.limit);
            }
        }

        let combinations = requirement.course_combinations(planned);
        if !combinations.is_empty() {
            println!("\n{}", "Planned course combinations that fulfill it".dim());
            for combination in combinations.iter().take(self.limit) {
                let codes: Vec<String> = combination.iter().map(|course| course.code()).collect();
                println!("  • {}", codes.join(", "));
            }
        }
    }

    fn output_json(
        &self,
        workspace: &Workspace,
        requirement: &Requirement,
        planned: &[Course],
    ) -> anyhow::Result<()> {
        use serde_json::json;

        let status = workspace.plan().map(|plan| {
            workspace
                .evaluator()
                .evaluate(planned, &plan.manually_fulfilled)
                .status(requirement)
        });

        let output = json!({
            "id": requirement.id(),
            "name": requirement.name(),
            "goal": workspace.catalog().goal_of(requirement.id()).map(|goal| goal.id()),
            "description": requirement.to_string(),
            "annotation": requirement.annotation(),
            "status": status,
            "candidates": Self::candidates(workspace, requirement)
                .iter()
                .take(self.limit)
                .map(|course| course.id())
                .collect::<Vec<_>>(),
            "combinations": requirement
                .course_combinations(planned)
                .iter()
                .take(self.limit)
                .map(|combination| combination.iter().map(|course| course.id()).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        });

        let rendered =
            serde_json::to_string_pretty(&output).context("failed to render json output")?;
        println!("{rendered}");
        Ok(())
    }
}
