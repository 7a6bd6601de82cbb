use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use cascade_migrate::{CompiledPackage, MigrateReport, PackageOutcome, PackageStatus, PlannedRun};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        if let Some(line) = render_section_header(self.style, title) {
            println!();
            println!("{}", colorize(section_style(), &line));
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    if std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "skip" => "[SKIP]",
        "dry" => "[DRY]",
        "warn" => "[WARN]",
        "err" => "[ERR]",
        _ => "[..]",
    }
}

pub(crate) fn format_outcome_line(outcome: &PackageOutcome, style: OutputStyle) -> String {
    match &outcome.status {
        PackageStatus::UpToDate => render_status_line(
            style,
            "skip",
            &format!(
                "{}: network '{}' up to date",
                outcome.package_name, outcome.network
            ),
        ),
        PackageStatus::Migrated { steps } => {
            let (status, verb) = if outcome.dry_run {
                ("dry", "would migrate")
            } else {
                ("ok", "migrated")
            };
            render_status_line(
                style,
                status,
                &format!(
                    "{}: {verb} {} on '{}'",
                    outcome.package_name,
                    format_steps(steps),
                    outcome.network
                ),
            )
        }
    }
}

pub(crate) fn format_migrate_lines(report: &MigrateReport, style: OutputStyle) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.outcomes.len() + 1);
    lines.push(report.banner.clone());
    lines.extend(
        report
            .outcomes
            .iter()
            .map(|outcome| format_outcome_line(outcome, style)),
    );
    lines
}

pub(crate) fn format_compile_lines(compiled: &[CompiledPackage], style: OutputStyle) -> Vec<String> {
    compiled
        .iter()
        .map(|package| {
            let summary = &package.summary;
            if summary.compiled.is_empty() {
                render_status_line(
                    style,
                    "skip",
                    &format!("{}: nothing to compile", package.package_name),
                )
            } else {
                render_status_line(
                    style,
                    "ok",
                    &format!(
                        "{}: compiled {} ({} unchanged)",
                        package.package_name,
                        summary.compiled.join(", "),
                        summary.unchanged.len()
                    ),
                )
            }
        })
        .collect()
}

/// Execution order first, then one `dependency -> dependent` line per edge.
pub(crate) fn format_plan_lines(planned: &PlannedRun) -> (Vec<String>, Vec<String>) {
    let order = planned.plan.package_ids();
    let edges = planned
        .edges
        .iter()
        .map(|edge| format!("{} -> {}", edge.dependency, edge.dependent))
        .collect();
    (order, edges)
}

fn format_steps(steps: &[u64]) -> String {
    let joined = steps
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    match steps.len() {
        1 => format!("step {joined}"),
        _ => format!("steps {joined}"),
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub(crate) fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(format!("== {title} ==")),
    }
}
