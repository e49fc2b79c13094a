use crate::WatchPlan;
use crate::watcher::event::WatchOutcome;

/// Print the planned watch set.
///
/// - `json = true`: emit the plan as a pretty-printed JSON object to stdout.
/// - `json = false`: one directory per line, preceded by a cargo-style summary on stderr
///   so that stdout can be piped straight into other tools.
pub fn print_plan(plan: &WatchPlan, json: bool) {
    if json {
        match serde_json::to_string_pretty(plan) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("error serialising watch plan: {}", e),
        }
        return;
    }

    eprintln!(
        "{} imports, {} non-std resolved, watching {} directories",
        plan.imports.len(),
        plan.resolved.len(),
        plan.watch_set.len(),
    );
    for dir in plan.watch_set.iter() {
        println!("{}", dir.display());
    }
}

/// Print why a watch returned.
pub fn print_outcome(outcome: &WatchOutcome, json: bool) {
    if json {
        match serde_json::to_string(outcome) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("error serialising outcome: {}", e),
        }
        return;
    }

    match outcome {
        WatchOutcome::Changed(path) => println!("changed {}", path.display()),
        WatchOutcome::StreamError(message) => println!("watch error {}", message),
        WatchOutcome::StreamClosed => println!("watch closed"),
        WatchOutcome::Cancelled => println!("cancelled"),
        WatchOutcome::TimedOut => println!("timed out"),
    }
}
