use std::path::PathBuf;

use clap::Parser;
use degreeplan::{Workspace, domain::GoalKind};
use tracing::instrument;

use super::terminal::{Colorize, is_narrow};

#[derive(Debug, Parser)]
#[command(about = "Search the catalog for goals")]
pub struct Goals {
    /// Text to search for in goal ids and names (including parent goals)
    #[arg(default_value = "")]
    prompt: String,

    /// Only show goals of this kind
    #[arg(long)]
    kind: Option<KindArg>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum KindArg {
    Major,
    Minor,
    Other,
}

impl From<KindArg> for GoalKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Major => Self::Major,
            KindArg::Minor => Self::Minor,
            KindArg::Other => Self::Other,
        }
    }
}

impl Goals {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        let catalog = workspace.catalog();
        let selected: Vec<&str> = workspace
            .plan()
            .map(|plan| plan.goals.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let matches = catalog.search(&self.prompt, self.kind.map(GoalKind::from));
        if matches.is_empty() {
            println!("No goals match '{}'", self.prompt);
            return Ok(());
        }

        let narrow = is_narrow();
        for kind in [GoalKind::Major, GoalKind::Minor, GoalKind::Other] {
            let goals: Vec<_> = matches.iter().filter(|goal| goal.kind() == kind).collect();
            if goals.is_empty() {
                continue;
            }
            println!("{}", format!("{kind}s").dim());
            for goal in goals {
                let marker = if selected.contains(&goal.id()) {
                    "*".success()
                } else {
                    " ".to_string()
                };
                let lineage: Vec<&str> = catalog
                    .lineage(goal.id())
                    .into_iter()
                    .skip(1)
                    .map(|ancestor| ancestor.name())
                    .collect();
                if narrow || lineage.is_empty() {
                    println!("{marker} {:<12} {}", goal.id(), goal.name());
                } else {
                    println!(
                        "{marker} {:<12} {} {}",
                        goal.id(),
                        goal.name(),
                        format!("({})", lineage.join(" < ")).dim()
                    );
                }
            }
        }
        Ok(())
    }
}
