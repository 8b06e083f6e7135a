use std::path::{Path, PathBuf};

mod goals;
mod init;
mod show;
mod status;
mod terminal;

use clap::ArgAction;
use degreeplan::{
    Course, Workspace,
    storage::workspace::{config_path, write_config},
};
use goals::Goals;
use init::Init;
use show::Show;
use status::Status;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the planning workspace
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show which requirements the plan fulfills (default)
    Status(Status),

    /// Create a plan for a range of years
    Init(Init),

    /// Search the catalog for majors, minors and other goals
    Goals(Goals),

    /// Show detailed information about a requirement
    Show(Show),

    /// Mark a requirement as fulfilled by hand
    ///
    /// Use this for requirements satisfied outside the plan, such as
    /// exam credit or transfer coursework.
    Fulfill(Fulfill),

    /// Remove a manual fulfillment
    Unfulfill(Unfulfill),

    /// Plan a course in a semester
    Add(Add),

    /// Remove a course from the plan
    Remove(Remove),

    /// Show or modify configuration settings
    Config(Config),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(root)?,
            Self::Init(command) => command.run(root)?,
            Self::Goals(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Fulfill(command) => command.run(root)?,
            Self::Unfulfill(command) => command.run(root)?,
            Self::Add(command) => command.run(root)?,
            Self::Remove(command) => command.run(root)?,
            Self::Config(command) => command.run(&root)?,
        }
        Ok(())
    }
}

/// Find a course by id, or by its code (`"COMPSCI 61A"`), ignoring case.
fn find_course<'a>(workspace: &'a Workspace, query: &str) -> anyhow::Result<&'a Course> {
    let courses = workspace.courses();
    courses
        .get(query)
        .or_else(|| {
            courses
                .iter()
                .find(|course| course.code().eq_ignore_ascii_case(query.trim()))
        })
        .ok_or_else(|| anyhow::anyhow!("Course '{query}' not found"))
}

#[derive(Debug, clap::Parser)]
pub struct Fulfill {
    /// The id of the requirement to mark as fulfilled
    id: String,
}

impl Fulfill {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut workspace = Workspace::open(root)?;
        let Some(requirement) = workspace.catalog().requirement(&self.id) else {
            anyhow::bail!("Requirement '{}' not found", self.id);
        };
        let name = requirement.name().to_string();

        let plan = workspace.require_plan_mut()?;
        if plan.manually_fulfilled.fulfill(&self.id) {
            workspace.save_plan()?;
            println!("{}", format!("Marked '{name}' as fulfilled").success());
        } else {
            println!("'{name}' is already marked as fulfilled");
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Unfulfill {
    /// The id of the requirement to unmark
    id: String,
}

impl Unfulfill {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut workspace = Workspace::open(root)?;
        let plan = workspace.require_plan_mut()?;
        if plan.manually_fulfilled.unfulfill(&self.id) {
            workspace.save_plan()?;
            println!(
                "{}",
                format!("Removed manual fulfillment of '{}'", self.id).success()
            );
        } else {
            println!("'{}' was not marked as fulfilled", self.id);
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// Course id or code, e.g. `compsci61a` or "COMPSCI 61A"
    course: String,

    /// Semester name, e.g. "Fall 2024"
    semester: String,
}

impl Add {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut workspace = Workspace::open(root)?;
        let course = find_course(&workspace, &self.course)?;
        let (id, code) = (course.id().to_string(), course.code());

        workspace
            .require_plan_mut()?
            .add_course(&id, &self.semester)?;
        workspace.save_plan()?;

        println!("{}", format!("Added {code} to {}", self.semester).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// Course id or code
    course: String,
}

impl Remove {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut workspace = Workspace::open(root)?;
        let course = find_course(&workspace, &self.course)?;
        let (id, code) = (course.id().to_string(), course.code());

        workspace.require_plan_mut()?.remove_course(&id)?;
        workspace.save_plan()?;

        println!("{}", format!("Removed {code} from the plan").success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, clap::Parser)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set
        value: String,
    },
}

impl Config {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        use terminal::Colorize;

        let path = config_path(root);
        let mut config = if path.exists() {
            degreeplan::Config::load(&path).map_err(|e| anyhow::anyhow!("{e}"))?
        } else {
            degreeplan::Config::default()
        };

        match self.command {
            ConfigCommand::Show => {
                println!("Configuration:");
                println!("  courses: {}", config.courses.display());
                println!(
                    "  catalog: {} ({})",
                    config.catalog.display(),
                    if root.join(&config.catalog).is_dir() {
                        "directory".dim()
                    } else {
                        "single file".dim()
                    }
                );
                println!("  plan: {}", config.plan.display());
                println!("  max_mutex_children: {}", config.max_mutex_children());
                println!("  allow_unrecognised: {}", config.allow_unrecognised);
            }
            ConfigCommand::Set { key, value } => {
                match key.as_str() {
                    "courses" => config.courses = PathBuf::from(&value),
                    "catalog" => config.catalog = PathBuf::from(&value),
                    "plan" => config.plan = PathBuf::from(&value),
                    "max_mutex_children" => {
                        let max = value
                            .parse::<usize>()
                            .map_err(|_| anyhow::anyhow!("Value must be a positive integer"))?;
                        if max == 0 {
                            anyhow::bail!("max_mutex_children must be at least 1");
                        }
                        config.set_max_mutex_children(max);
                    }
                    "allow_unrecognised" => {
                        config.allow_unrecognised = value
                            .parse::<bool>()
                            .map_err(|_| anyhow::anyhow!("Value must be 'true' or 'false'"))?;
                    }
                    _ => {
                        anyhow::bail!(
                            "Unknown configuration key: '{key}'\nSupported keys: courses, \
                             catalog, plan, max_mutex_children, allow_unrecognised"
                        );
                    }
                }
                write_config(root, &config)?;
                println!("{}", format!("Set {key} = {value}").success());
            }
        }
        Ok(())
    }
}
