use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};
use sdtm_cli::pipeline::StudyOutcome;
use sdtm_model::{Defect, Severity};
use sdtm_standards::DomainRegistry;

/// Defects listed in the terminal; the JSON report carries all of them.
const MAX_LISTED_DEFECTS: usize = 50;

pub fn print_summary(outcome: &StudyOutcome, report_path: Option<&Path>) {
    let report = &outcome.report;
    if let Some(study_id) = &report.study_id {
        println!("Study: {study_id}");
    }
    println!("Derivation order: {}", report.order.join(" -> "));
    if let Some(path) = report_path {
        println!("Report: {}", path.display());
    }
    print_domain_table(outcome);
    print_layer_table(outcome);
    print_defect_table(&report.conformance.defects);
    print_verdict(outcome);
}

fn print_domain_table(outcome: &StudyOutcome) {
    let registry = DomainRegistry::builtin();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Domain"),
        header_cell("Label"),
        header_cell("Records"),
        header_cell("Blocking"),
        header_cell("Advisory"),
        header_cell("Info"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let conformance = &outcome.report.conformance;
    let mut total_records = 0usize;
    for frame in outcome.tables.iter() {
        let code = frame.domain_code.as_str();
        let label = registry.domain(code).map(|d| d.label.as_str()).unwrap_or_default();
        let failed = outcome.report.failed.iter().any(|f| f == code);
        let (blocking, advisory, informational) = conformance
            .domain(code)
            .map_or((0, 0, 0), |s| (s.blocking, s.advisory, s.informational));
        total_records += frame.record_count();
        table.add_row(vec![
            domain_cell(code, failed),
            Cell::new(label),
            Cell::new(frame.record_count()),
            count_cell(blocking, Color::Red),
            count_cell(advisory, Color::Yellow),
            count_cell(informational, Color::DarkGrey),
        ]);
    }
    let counts = conformance.counts;
    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new("All domains").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(total_records).add_attribute(Attribute::Bold),
        count_cell(counts.blocking, Color::Red).add_attribute(Attribute::Bold),
        count_cell(counts.advisory, Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(counts.informational, Color::DarkGrey).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn print_layer_table(outcome: &StudyOutcome) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Layer"),
        header_cell("Weight"),
        header_cell("Checked"),
        header_cell("Passed"),
        header_cell("Score"),
    ]);
    apply_table_style(&mut table);
    for index in 1..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for layer in &outcome.report.conformance.layers {
        let score = Cell::new(format!("{:.1}", layer.score));
        let score = if layer.passed == layer.checked {
            score.fg(Color::Green)
        } else {
            score.fg(Color::Red).add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            Cell::new(layer.layer.as_str()),
            Cell::new(format!("{:.2}", layer.weight)),
            Cell::new(layer.checked),
            Cell::new(layer.passed),
            score,
        ]);
    }
    println!();
    println!("{table}");
}

fn print_defect_table(defects: &[Defect]) {
    if defects.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Domain"),
        header_cell("Rule"),
        header_cell("Variable"),
        header_cell("Records"),
        header_cell("Message"),
    ]);
    apply_defect_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for defect in defects.iter().take(MAX_LISTED_DEFECTS) {
        table.add_row(vec![
            severity_cell(defect.severity),
            Cell::new(&defect.domain).fg(Color::Blue),
            Cell::new(defect.rule_id.code()),
            Cell::new(defect.variable.as_deref().unwrap_or("-")),
            Cell::new(defect.records.len()),
            Cell::new(&defect.message),
        ]);
    }
    println!();
    println!("Defects:");
    println!("{table}");
    if defects.len() > MAX_LISTED_DEFECTS {
        println!(
            "... {} more, see the JSON report",
            defects.len() - MAX_LISTED_DEFECTS
        );
    }
}

fn print_verdict(outcome: &StudyOutcome) {
    let conformance = &outcome.report.conformance;
    let verdict = if conformance.ready {
        "READY"
    } else {
        "NOT READY"
    };
    println!();
    println!(
        "Score {:.1} (threshold {:.1}): {verdict}",
        conformance.score, conformance.threshold
    );
    if !outcome.report.failed.is_empty() {
        eprintln!("Failed domains: {}", outcome.report.failed.join(", "));
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Fixed(8)),
        ColumnConstraint::UpperBoundary(Width::Percentage(45)),
        ColumnConstraint::LowerBoundary(Width::Fixed(9)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
    ]);
}

fn apply_defect_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Fixed(9)),
        ColumnConstraint::UpperBoundary(Width::Fixed(8)),
        ColumnConstraint::UpperBoundary(Width::Fixed(8)),
        ColumnConstraint::UpperBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(7)),
        ColumnConstraint::UpperBoundary(Width::Percentage(60)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Blocking => Cell::new("BLOCK").fg(Color::Red).add_attribute(Attribute::Bold),
        Severity::Advisory => Cell::new("ADVISE").fg(Color::Yellow),
        Severity::Informational => Cell::new("INFO").fg(Color::DarkGrey),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

fn domain_cell(code: &str, failed: bool) -> Cell {
    if failed {
        Cell::new(format!("{code} !")).fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        Cell::new(code).fg(Color::Blue).add_attribute(Attribute::Bold)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
