use console::Style;

use crate::mutants::Mutant;
use crate::report::RunSummary;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

pub fn print_progress(msg: &str) {
    let dim = Style::new().dim();
    println!("{}", dim.apply_to(msg));
}

pub fn print_summary(summary: &RunSummary) {
    let style = Style::new().green().bold();
    println!(
        "{} {}: {} functions evaluated",
        style.apply_to("✓"),
        summary.mode,
        summary.functions,
    );
    for (strategy, stat) in &summary.strategy_stats {
        let label = if summary.mode == "completeness" {
            format!("{:.1}% mean kill rate", stat)
        } else {
            format!("{:.1}% pass", stat * 100.0)
        };
        let name_style = Style::new().cyan();
        println!("  {} {}", name_style.apply_to(strategy), label);
    }
}

pub fn generate_diff(original: &str, mutated: &str) -> String {
    use similar::TextDiff;
    let diff = TextDiff::from_lines(original, mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                output.push_str(&format!("- {}", change));
            }
            similar::ChangeTag::Insert => {
                output.push_str(&format!("+ {}", change));
            }
            _ => {}
        }
    }
    output
}

pub fn print_mutants(original: &str, mutants: &[Mutant]) {
    for (i, mutant) in mutants.iter().enumerate() {
        let ref_style = Style::new().cyan().bold();
        let op_style = Style::new().magenta();
        println!(
            "{} [{}] site {} ({})",
            ref_style.apply_to(format!("@m{}", i + 1)),
            op_style.apply_to(&mutant.operator),
            mutant.site,
            mutant.provenance,
        );
        for line in generate_diff(original, &mutant.code).lines() {
            if line.starts_with('-') {
                let del = Style::new().red();
                println!("  {}", del.apply_to(line));
            } else if line.starts_with('+') {
                let add = Style::new().green();
                println!("  {}", add.apply_to(line));
            }
        }
        println!();
    }
}
