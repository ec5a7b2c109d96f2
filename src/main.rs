use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use course_nav::{
    course::Module,
    navigation::{CourseNavigationTree, NavigationState, course_progress},
    utils::init_log,
};
use tracing::info;

/// Print the navigation tree of a course read from a JSON module list.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file holding an array of modules with their lessons
    modules: PathBuf,

    /// Current module; defaults to the first unfinished lesson
    #[arg(short = 'm', long, requires = "lesson")]
    module: Option<i64>,

    /// Current lesson
    #[arg(short = 'l', long, requires = "module")]
    lesson: Option<i64>,

    /// Overall course progress for the header; computed from the modules when absent
    #[arg(short, long)]
    progress: Option<u8>,

    /// Expand or collapse a module before printing, may repeat
    #[arg(short, long)]
    toggle: Vec<i64>,

    /// Activate a lesson, given as MODULE:LESSON
    #[arg(short, long, value_parser = parse_selection)]
    select: Option<(i64, i64)>,

    /// Print the render shape as JSON instead of an outline
    #[arg(long)]
    json: bool,
}

fn parse_selection(s: &str) -> Result<(i64, i64), String> {
    let (module, lesson) = s
        .split_once(':')
        .ok_or_else(|| format!("expected MODULE:LESSON, got {s}"))?;
    let module = module.trim().parse().map_err(|e| format!("bad module id: {e}"))?;
    let lesson = lesson.trim().parse().map_err(|e| format!("bad lesson id: {e}"))?;
    Ok((module, lesson))
}

fn main() -> anyhow::Result<()> {
    let _guard = init_log(None)?;
    let args = Cli::parse();

    let text = std::fs::read_to_string(&args.modules)
        .with_context(|| format!("read {}", args.modules.display()))?;
    let modules: Vec<Module> = serde_json::from_str(&text)
        .with_context(|| format!("parse {}", args.modules.display()))?;

    let state = match (args.module, args.lesson) {
        (Some(module), Some(lesson)) => NavigationState::new(module, lesson),
        _ => NavigationState::resume(&modules),
    };
    let overall = args.progress.unwrap_or_else(|| course_progress(&modules));

    let mut selected = None;
    let mut tree = CourseNavigationTree::from_state(modules, state, |m, l| selected = Some((m, l)))
        .with_course_progress(overall);
    for module_id in &args.toggle {
        if !tree.toggle_module(*module_id) {
            info!("module {} was not toggled", module_id);
        }
    }
    if let Some((module_id, lesson_id)) = args.select {
        tree.select_lesson(module_id, lesson_id);
    }
    let view = tree.render();
    drop(tree);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{view}");
    }
    if let Some((module_id, lesson_id)) = selected {
        println!("selected lesson {lesson_id} of module {module_id}");
    }
    Ok(())
}
