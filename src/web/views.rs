//! Server-rendered pages: the lifestyle form and the report with its chart.

use std::collections::HashMap;
use std::fmt::Write;

use crate::footprint::input::{RecycleMaterial, TransportMode};
use crate::report::Report;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2d1f; background: #f4f8f2; }
header { background: #2e7d32; color: white; padding: 1rem 2rem; }
main { display: flex; gap: 2rem; padding: 1.5rem 2rem; flex-wrap: wrap; }
form { background: white; padding: 1rem 1.5rem; border-radius: 8px; min-width: 280px; }
fieldset { border: 1px solid #cfe3c9; margin-bottom: 1rem; }
label { display: block; margin: .4rem 0; }
input[type=text], input[type=number], select { width: 100%; }
section.results { flex: 1; min-width: 320px; }
.warning { background: #fff4d6; border-left: 4px solid #e0a800; padding: .5rem 1rem; }
.error { background: #fde2e1; border-left: 4px solid #c62828; padding: .5rem 1rem; }
.info { background: #e3f2fd; border-left: 4px solid #1976d2; padding: .5rem 1rem; }
.tips { white-space: pre-wrap; background: white; padding: 1rem; border-radius: 8px; }
"#;

/// Raw form values, kept so a rejected submission can be shown again.
#[derive(Debug, Default)]
pub struct FormValues {
    values: HashMap<String, Vec<String>>,
}

impl FormValues {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            values.entry(key.clone()).or_default().push(value.clone());
        }
        Self { values }
    }

    fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
            .unwrap_or(default)
    }

    fn has(&self, key: &str, value: &str) -> bool {
        self.values
            .get(key)
            .is_some_and(|v| v.iter().any(|x| x.eq_ignore_ascii_case(value)))
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header><h1>🌍 GreenMe - Reduce Your Carbon Footprint</h1>\n\
         <p>Welcome to <strong>GreenMe</strong>, your personal eco-assistant. \
         Understand and <strong>reduce your carbon footprint</strong> while making sustainable choices for a greener future. 🌱</p>\
         </header>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn number_field(out: &mut String, values: &FormValues, name: &str, label: &str, default: &str, attrs: &str) {
    let _ = writeln!(
        out,
        "<label>{label}<input type=\"number\" name=\"{name}\" value=\"{value}\" {attrs}></label>",
        value = escape_html(values.get(name, default)),
    );
}

fn form(values: &FormValues) -> String {
    let mut out = String::new();
    out.push_str("<form method=\"post\" action=\"/report\">\n<h2>Enter Your Details</h2>\n");

    let _ = writeln!(
        out,
        "<label>Nickname<input type=\"text\" name=\"nickname\" value=\"{}\"></label>",
        escape_html(values.get("nickname", ""))
    );
    let _ = writeln!(
        out,
        "<label>Region<input type=\"text\" name=\"region\" value=\"{}\"></label>",
        escape_html(values.get("region", ""))
    );
    number_field(&mut out, values, "family_size", "Family Size", "1", "min=\"1\" step=\"1\"");

    out.push_str("<fieldset><legend>Energy Details</legend>\n");
    number_field(&mut out, values, "energy_kwh", "Monthly Energy Use (kWh)", "0", "min=\"0\" step=\"0.1\"");
    let _ = writeln!(
        out,
        "<label>Renewable Energy Usage (%)<input type=\"range\" name=\"renewable_ratio\" min=\"0\" max=\"100\" value=\"{}\"></label>",
        escape_html(values.get("renewable_ratio", "0"))
    );
    out.push_str("</fieldset>\n<fieldset><legend>Water Usage</legend>\n");
    number_field(&mut out, values, "water_liters", "Monthly Water Use (liters)", "0", "min=\"0\" step=\"0.1\"");

    out.push_str("</fieldset>\n<fieldset><legend>Commute Info</legend>\n");
    number_field(&mut out, values, "commute_km", "Weekly Commute (km)", "0", "min=\"0\" step=\"0.1\"");
    out.push_str("<label>Mode of Transport<select name=\"transport_mode\">\n");
    let selected_mode = values.get("transport_mode", TransportMode::Car.id());
    for mode in TransportMode::ALL {
        let selected = mode.id().eq_ignore_ascii_case(selected_mode)
            || mode.label().eq_ignore_ascii_case(selected_mode);
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            mode.id(),
            if selected { " selected" } else { "" },
            mode.label()
        );
    }
    out.push_str("</select></label>\n</fieldset>\n");

    out.push_str("<fieldset><legend>Waste Details</legend>\n");
    number_field(&mut out, values, "weekly_waste_kg", "Weekly Waste (kg)", "0", "min=\"0\" step=\"0.1\"");
    out.push_str("<p>Recycled Materials</p>\n");
    for material in RecycleMaterial::ALL {
        let checked = values.has("recycle", material.id()) || values.has("recycle", material.label());
        let _ = writeln!(
            out,
            "<label><input type=\"checkbox\" name=\"recycle\" value=\"{}\"{}> {}</label>",
            material.id(),
            if checked { " checked" } else { "" },
            material.label()
        );
    }
    out.push_str("</fieldset>\n<button type=\"submit\">Generate Tips</button>\n</form>\n");
    out
}

pub fn form_page(values: &FormValues, error: Option<&str>) -> String {
    let mut body = form(values);
    body.push_str("<section class=\"results\">\n<h2>Your Eco Insights</h2>\n");
    match error {
        Some(message) => {
            let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(message));
        }
        None => body.push_str(
            "<p class=\"info\">Enter details in the form and click 'Generate Tips'!</p>\n",
        ),
    }
    body.push_str("</section>");
    layout("GreenMe", &body)
}

/// Horizontal bar chart of kg CO2 per category, scaled to the largest bar.
pub fn bar_chart_svg(categories: &[(&str, f64)]) -> String {
    const WIDTH: f64 = 520.0;
    const LABEL: f64 = 90.0;
    const BAR_AREA: f64 = 330.0;
    const ROW: f64 = 44.0;

    let max = categories
        .iter()
        .map(|(_, kg)| *kg)
        .filter(|kg| kg.is_finite())
        .fold(0.0_f64, f64::max);
    let height = ROW * categories.len() as f64 + 30.0;

    let mut svg = format!(
        "<svg class=\"chart\" xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{height}\" \
         role=\"img\" aria-label=\"CO2 Emissions (kg) by category\">\n"
    );
    for (i, (label, kg)) in categories.iter().enumerate() {
        let kg = if kg.is_finite() && *kg > 0.0 { *kg } else { 0.0 };
        let width = if max > 0.0 { kg / max * BAR_AREA } else { 0.0 };
        let y = i as f64 * ROW + 10.0;
        let _ = writeln!(
            svg,
            "<text x=\"0\" y=\"{ty:.1}\" font-size=\"14\">{label}</text>\
             <rect x=\"{LABEL}\" y=\"{y:.1}\" width=\"{width:.1}\" height=\"28\" fill=\"#43a047\"/>\
             <text x=\"{vx:.1}\" y=\"{ty:.1}\" font-size=\"13\">{kg:.2} kg</text>",
            ty = y + 19.0,
            label = escape_html(label),
            vx = LABEL + width + 6.0,
        );
    }
    let _ = writeln!(
        svg,
        "<text x=\"{LABEL}\" y=\"{:.1}\" font-size=\"12\" fill=\"#555\">CO2 Emissions (kg)</text>\n</svg>",
        height - 4.0
    );
    svg
}

pub fn result_page(report: &Report) -> String {
    let values = FormValues::from_pairs(&form_pairs(report));
    let mut body = form(&values);

    body.push_str("<section class=\"results\">\n<h2>Carbon Footprint Breakdown</h2>\n");
    for warning in &report.breakdown.warnings {
        let _ = writeln!(body, "<p class=\"warning\">{}</p>", escape_html(warning));
    }
    body.push_str(&bar_chart_svg(&report.breakdown.categories()));
    let _ = writeln!(
        body,
        "<p>Total: <strong>{:.2} kg CO2</strong> (monthly energy + weekly commute)</p>",
        report.breakdown.total_kg()
    );

    body.push_str("<h2>Eco-Friendly Tips</h2>\n");
    match (&report.tips, &report.tips_error) {
        (Some(tips), _) => {
            let _ = writeln!(body, "<div class=\"tips\">{}</div>", escape_html(tips));
        }
        (None, Some(error)) => {
            let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(error));
        }
        (None, None) => body.push_str("<p class=\"error\">No tips were generated.</p>\n"),
    }
    body.push_str("</section>");

    layout(&format!("GreenMe - {}", report.input.nickname), &body)
}

fn form_pairs(report: &Report) -> Vec<(String, String)> {
    let input = &report.input;
    let mut pairs = vec![
        ("nickname".to_string(), input.nickname.clone()),
        ("region".to_string(), input.region.clone()),
        ("family_size".to_string(), input.family_size.to_string()),
        ("energy_kwh".to_string(), input.energy_kwh.to_string()),
        ("renewable_ratio".to_string(), input.renewable_ratio.to_string()),
        ("water_liters".to_string(), input.water_liters.to_string()),
        ("commute_km".to_string(), input.commute_km.to_string()),
        ("transport_mode".to_string(), input.transport_mode.id().to_string()),
        ("weekly_waste_kg".to_string(), input.weekly_waste_kg.to_string()),
    ];
    pairs.extend(
        input
            .recycled
            .iter()
            .map(|m| ("recycle".to_string(), m.id().to_string())),
    );
    pairs
}
