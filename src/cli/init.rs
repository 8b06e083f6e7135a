use std::path::PathBuf;

use degreeplan::{
    Config, Plan, Workspace,
    storage::workspace::{config_path, write_config},
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
#[command(about = "Create a plan running from fall of the start year to spring of the graduation year")]
pub struct Init {
    /// The year of the first fall semester
    #[arg(long)]
    start: i32,

    /// The graduation year
    #[arg(long)]
    grad: i32,

    /// Include summer semesters
    #[arg(long)]
    summer: bool,

    /// Goals (majors, minors, ...) to pursue, by id
    #[arg(long = "goal", value_name = "GOAL")]
    goals: Vec<String>,

    /// Replace an existing plan
    #[arg(long)]
    force: bool,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        if !config_path(&root).exists() {
            write_config(&root, &Config::default())?;
            println!("Created {}", config_path(&root).display());
        }

        let mut workspace = Workspace::open(root)?;
        if workspace.plan().is_some() && !self.force {
            anyhow::bail!(
                "A plan already exists at {} (use --force to replace it)",
                workspace.plan_path().display()
            );
        }

        for goal in &self.goals {
            if workspace.catalog().goal(goal).is_none() {
                anyhow::bail!("Unknown goal '{goal}'. Run 'plan goals' to list goals.");
            }
        }

        let plan = Plan::new(self.start, self.grad, self.summer, self.goals)?;
        let semesters = plan.semesters.len();
        workspace.set_plan(plan);
        workspace.save_plan()?;

        println!(
            "{}",
            format!(
                "Created a plan with {semesters} semesters at {}",
                workspace.plan_path().display()
            )
            .success()
        );
        Ok(())
    }
}
