use std::{path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use degreeplan::{
    Course, FulfillmentMap, Requirement, Status as Fulfillment, Workspace, domain::Goal,
};
use serde_json::{Value, json};
use tracing::instrument;

use super::terminal::{Colorize, is_narrow, status_icon};

#[derive(Debug, Parser, Default)]
#[command(about = "Show the plan and which requirements it fulfills")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress the tree and print only totals, for scripting
    #[arg(long)]
    quiet: bool,

    /// Exit with code 2 if any requirement is not fulfilled
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Totals for the selected goals.
///
/// Fulfilled and unfulfilled count root requirements. Roots are never
/// potential, so potential counts every node in the trees, which in practice
/// means mutex children competing for a course.
#[derive(Debug, Default, PartialEq, Eq)]
struct Totals {
    fulfilled: usize,
    potential: usize,
    unfulfilled: usize,
}

impl Totals {
    fn count(goals: &[&Goal], map: &FulfillmentMap) -> Self {
        let mut totals = Self::default();
        for requirement in goals.iter().flat_map(|goal| goal.requirements()) {
            if map.status(requirement).is_fulfilled() {
                totals.fulfilled += 1;
            } else {
                totals.unfulfilled += 1;
            }
        }
        totals.potential = goals
            .iter()
            .flat_map(|goal| goal.requirements())
            .flat_map(Requirement::walk)
            .filter(|node| map.status(node) == Fulfillment::Potential)
            .count();
        totals
    }

    /// Whether every root requirement is fulfilled.
    const fn complete(&self) -> bool {
        self.unfulfilled == 0
    }
}

impl Status {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        let plan = workspace.require_plan()?;
        let courses = workspace.planned_courses()?;
        let map = workspace
            .evaluator()
            .evaluate(&courses, &plan.manually_fulfilled);

        let goals = workspace
            .catalog()
            .requirement_sets(plan.goals.iter().map(String::as_str));

        if goals.is_empty() {
            println!("No goals selected yet. Choose some with 'plan init --goal <GOAL>'.");
            return Ok(());
        }

        let totals = Totals::count(&goals, &map);

        match self.output {
            OutputFormat::Json => Self::output_json(&workspace, &goals, &map, &courses, &totals)?,
            OutputFormat::Table => {
                if self.quiet {
                    Self::output_quiet(&totals);
                } else {
                    Self::output_table(&workspace, &goals, &map, &courses, &totals);
                }
            }
        }

        if self.check && !totals.complete() {
            process::exit(2);
        }

        Ok(())
    }

    fn output_quiet(totals: &Totals) {
        println!(
            "fulfilled={} potential={} unfulfilled={}",
            totals.fulfilled, totals.potential, totals.unfulfilled
        );
    }

    fn output_table(
        workspace: &Workspace,
        goals: &[&Goal],
        map: &FulfillmentMap,
        courses: &[Course],
        totals: &Totals,
    ) {
        let narrow = is_narrow();

        if let Some(plan) = workspace.plan() {
            println!("Plan");
            println!("{}", "────".dim());
            for semester in &plan.semesters {
                let codes: Vec<String> = semester
                    .courses
                    .iter()
                    .filter_map(|id| workspace.courses().get(id))
                    .map(Course::code)
                    .collect();
                let codes = if codes.is_empty() {
                    "-".dim()
                } else {
                    codes.join(", ")
                };
                if narrow {
                    println!("{}:\n  {codes}", semester.name);
                } else {
                    println!("{:<12} {codes}", semester.name);
                }
            }
            println!();
        }

        for goal in goals {
            println!("{} {}", goal.name(), format!("({})", goal.kind()).dim());
            for category in goal.categories() {
                println!("  {}", category.name().dim());
                for requirement in category.requirements() {
                    print_tree(requirement, map, courses, 2, narrow);
                }
            }
            println!();
        }

        println!(
            "Fulfilled: {}  Potential: {}  Unfulfilled: {}",
            totals.fulfilled.to_string().success(),
            totals.potential.to_string().warning(),
            totals.unfulfilled.to_string().error()
        );
        if totals.potential > 0 {
            println!(
                "{}",
                "Potential requirements compete for the same course; add courses to settle them."
                    .dim()
            );
        }
    }

    fn output_json(
        workspace: &Workspace,
        goals: &[&Goal],
        map: &FulfillmentMap,
        courses: &[Course],
        totals: &Totals,
    ) -> anyhow::Result<()> {
        let plan = workspace.require_plan()?;
        let goals: Vec<_> = goals
            .iter()
            .map(|goal| {
                json!({
                    "id": goal.id(),
                    "name": goal.name(),
                    "kind": goal.kind(),
                    "categories": goal.categories().iter().map(|category| json!({
                        "id": category.id(),
                        "name": category.name(),
                        "requirements": category
                            .requirements()
                            .iter()
                            .map(|requirement| node_json(requirement, map, courses))
                            .collect::<Vec<_>>(),
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();

        let output = json!({
            "plan": plan.id,
            "semesters": plan.semesters,
            "goals": goals,
            "totals": {
                "fulfilled": totals.fulfilled,
                "potential": totals.potential,
                "unfulfilled": totals.unfulfilled,
            },
        });

        let rendered =
            serde_json::to_string_pretty(&output).context("failed to render json output")?;
        println!("{rendered}");
        Ok(())
    }
}

const fn kind_name(requirement: &Requirement) -> &'static str {
    match requirement {
        Requirement::Standalone(_) => "standalone",
        Requirement::Unit(_) => "unit",
        Requirement::Count(_) => "count",
        Requirement::Multi(_) => "multi",
        Requirement::Poly(_) => "poly",
        Requirement::Mutex(_) => "mutex",
        Requirement::Plain(_) => "plain",
    }
}

/// The one-line label of a node in the tree view.
fn label(requirement: &Requirement, map: &FulfillmentMap, courses: &[Course]) -> String {
    match requirement {
        Requirement::Multi(multi) | Requirement::Poly(multi) => {
            let fulfilled = map
                .get(requirement.id())
                .and_then(|node| node.fulfilled_children)
                .unwrap_or_default();
            format!("{}: {}", requirement.name(), multi.header(fulfilled))
        }
        Requirement::Mutex(_) => format!("{}: each by a different course", requirement.name()),
        Requirement::Unit(unit) => format!(
            "{unit} ({}/{})",
            unit.matching_units(courses),
            unit.units()
        ),
        Requirement::Count(count) => format!(
            "{count} ({}/{})",
            count.matching_count(courses),
            count.count()
        ),
        Requirement::Standalone(_) | Requirement::Plain(_) => requirement.to_string(),
    }
}

fn print_tree(
    requirement: &Requirement,
    map: &FulfillmentMap,
    courses: &[Course],
    depth: usize,
    narrow: bool,
) {
    let status = map.status(requirement);
    let indent = if narrow { depth } else { depth * 2 };
    let manual = if map.is_manual(requirement) {
        format!(" {}", "(manual)".dim())
    } else {
        String::new()
    };
    println!(
        "{:indent$}{} {}{manual}",
        "",
        status_icon(status).status(status),
        label(requirement, map, courses),
    );

    if let Some(annotation) = requirement.annotation() {
        for line in annotation.lines() {
            println!("{:indent$}  {}", "", line.dim());
        }
        return;
    }

    for child in requirement.children() {
        print_tree(child, map, courses, depth + 1, narrow);
    }
}

fn node_json(requirement: &Requirement, map: &FulfillmentMap, courses: &[Course]) -> Value {
    let node = map.get(requirement.id());
    let mut value = json!({
        "id": requirement.id(),
        "name": requirement.name(),
        "kind": kind_name(requirement),
        "status": map.status(requirement),
        "manual": node.is_some_and(|node| node.manual),
        "description": requirement.to_string(),
    });
    if let Some(annotation) = requirement.annotation() {
        value["annotation"] = json!(annotation);
    }
    match requirement {
        Requirement::Unit(unit) => {
            value["progress"] = json!({
                "have": unit.matching_units(courses),
                "need": unit.units(),
            });
        }
        Requirement::Count(count) => {
            value["progress"] = json!({
                "have": count.matching_count(courses),
                "need": count.count(),
            });
        }
        _ => {}
    }
    if let Some(fulfilled) = node.and_then(|node| node.fulfilled_children) {
        value["fulfilledChildren"] = json!(fulfilled);
    }
    if !requirement.children().is_empty() {
        value["children"] = requirement
            .children()
            .iter()
            .map(|child| node_json(child, map, courses))
            .collect();
    }
    value
}
