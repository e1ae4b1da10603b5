use colored::Colorize;

const BAR_WIDTH: usize = 40;

/// Rows of `label │█████ value kg`, bars scaled to the largest value.
pub fn bar_lines(categories: &[(&str, f64)]) -> Vec<String> {
    let max = categories
        .iter()
        .map(|(_, kg)| *kg)
        .filter(|kg| kg.is_finite())
        .fold(0.0_f64, f64::max);
    let label_width = categories.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    categories
        .iter()
        .map(|(label, kg)| {
            let kg = if kg.is_finite() && *kg > 0.0 { *kg } else { 0.0 };
            let cells = if max > 0.0 {
                ((kg / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            format!(
                "{label:>label_width$} │{} {kg:.2} kg",
                "█".repeat(cells).green(),
            )
        })
        .collect()
}

pub fn print_chart(title: &str, categories: &[(&str, f64)]) {
    println!("{}", title.bold());
    for line in bar_lines(categories) {
        println!("  {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_scale_to_largest() {
        colored::control::set_override(false);
        let lines = bar_lines(&[("Energy", 100.0), ("Commute", 25.0)]);

        assert_eq!(lines[0], format!(" Energy │{} 100.00 kg", "█".repeat(40)));
        assert_eq!(lines[1], format!("Commute │{} 25.00 kg", "█".repeat(10)));
    }

    #[test]
    fn test_zero_values_draw_empty_bars() {
        colored::control::set_override(false);
        let lines = bar_lines(&[("Energy", 0.0), ("Commute", 0.0)]);
        assert_eq!(lines[0], " Energy │ 0.00 kg");
    }
}
