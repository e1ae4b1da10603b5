use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

use super::emissions::FootprintBreakdown;
use super::input::LifestyleInput;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"));

/// Variables the sustainability report template is filled with.
pub const REPORT_VARIABLES: [&str; 11] = [
    "nickname",
    "region",
    "family_size",
    "energy_emissions",
    "renewable_ratio",
    "water_consumption",
    "commute_emissions",
    "weekly_travel",
    "transport_mode",
    "weekly_waste",
    "recycle_types",
];

const SUSTAINABILITY_REPORT: &str = r#"Generate a detailed sustainability lifestyle report for {nickname}, who resides in {region} with a household of {family_size} members.
Their current lifestyle details are:
- Energy usage contributing to {energy_emissions} kg of CO2 emissions monthly, with {renewable_ratio}% from renewables.
- Water usage of {water_consumption} liters monthly.
- Weekly travel of {weekly_travel} km using {transport_mode}, contributing to {commute_emissions} kg of CO2 emissions.
- Waste generation of {weekly_waste} kg weekly, with recycling of {recycle_types}.

Provide recommendations to improve their sustainability practices and reduce carbon footprint across:

1. **Energy**: suggest ways to reduce energy emissions and reliance on non-renewables.
2. **Water**: give tips for conserving water and reducing wasteful consumption.
3. **Transportation**: highlight actionable strategies to minimize travel emissions for someone travelling by {transport_mode}.
4. **Waste Management**: recommend ways to reduce {weekly_waste} kg of weekly waste and improve recycling of {recycle_types}.

Make every suggestion:
- Specific to {nickname}'s household size, region and current practices.
- Measurable, with clear outcomes such as CO2 saved, cost reduced or water saved.
- Practical as well as good for the environment.
"#;

#[derive(Error, Debug, PartialEq)]
pub enum PromptError {
    #[error("template uses undeclared placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("declared variable {0} never appears in the template")]
    UnusedVariable(String),

    #[error("no value supplied for {{{0}}}")]
    MissingVariable(String),

    #[error("cannot read template {path}: {message}")]
    Io { path: String, message: String },
}

/// Text with `{name}` placeholders, checked against a fixed variable set.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new<S: AsRef<str>>(template: impl Into<String>, variables: &[S]) -> Result<Self, PromptError> {
        let template = template.into();
        let variables: Vec<String> = variables.iter().map(|v| v.as_ref().to_string()).collect();

        let used: BTreeSet<&str> = PLACEHOLDER
            .captures_iter(&template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        if let Some(unknown) = used.iter().find(|name| !variables.iter().any(|v| v == *name)) {
            return Err(PromptError::UnknownPlaceholder(unknown.to_string()));
        }
        if let Some(unused) = variables.iter().find(|v| !used.contains(v.as_str())) {
            return Err(PromptError::UnusedVariable(unused.clone()));
        }

        Ok(Self { template, variables })
    }

    pub fn sustainability_report() -> Self {
        Self::new(SUSTAINABILITY_REPORT, &REPORT_VARIABLES).expect("built-in template is valid")
    }

    /// Loads a custom report template; it must use exactly the report variables.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| PromptError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::new(template, &REPORT_VARIABLES)
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Substitutes every placeholder in a single pass. Values are inserted
    /// as-is and never scanned for further placeholders.
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String, PromptError> {
        if let Some(missing) = self.variables.iter().find(|v| !values.contains_key(v.as_str())) {
            return Err(PromptError::MissingVariable(missing.clone()));
        }

        let rendered = PLACEHOLDER.replace_all(&self.template, |caps: &regex::Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.trim().to_string())
    }
}

/// Values for the report template; emission figures rounded to two decimals.
pub fn report_variables(input: &LifestyleInput, breakdown: &FootprintBreakdown) -> HashMap<&'static str, String> {
    HashMap::from([
        ("nickname", input.nickname.clone()),
        ("region", input.region.clone()),
        ("family_size", input.family_size.to_string()),
        ("energy_emissions", format!("{:.2}", breakdown.energy_kg)),
        ("renewable_ratio", input.renewable_ratio.to_string()),
        ("water_consumption", format_quantity(input.water_liters)),
        ("commute_emissions", format!("{:.2}", breakdown.commute_kg)),
        ("weekly_travel", format_quantity(input.commute_km)),
        ("transport_mode", input.transport_mode.label().to_string()),
        ("weekly_waste", format_quantity(input.weekly_waste_kg)),
        ("recycle_types", input.recycled_label()),
    ])
}

/// Shortest form that reads back as the same number: `40`, `0.04`, `8500.5`.
fn format_quantity(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::emissions::EmissionSource;
    use crate::footprint::input::{RecycleMaterial, TransportMode};

    fn sample() -> (LifestyleInput, FootprintBreakdown) {
        let input = LifestyleInput {
            nickname: "Mei".to_string(),
            region: "Taipei".to_string(),
            family_size: 3,
            energy_kwh: 300.0,
            renewable_ratio: 20,
            water_liters: 8500.5,
            commute_km: 60.0,
            transport_mode: TransportMode::Bus,
            weekly_waste_kg: 4.0,
            recycled: vec![RecycleMaterial::Paper, RecycleMaterial::Glass],
        };
        let breakdown = FootprintBreakdown {
            energy_kg: 123.456,
            commute_kg: 7.2,
            source: EmissionSource::Api,
            warnings: Vec::new(),
        };
        (input, breakdown)
    }

    #[test]
    fn test_report_is_fully_substituted() {
        let (input, breakdown) = sample();
        let template = PromptTemplate::sustainability_report();

        let prompt = template.render(&report_variables(&input, &breakdown)).unwrap();

        for name in REPORT_VARIABLES {
            assert!(!prompt.contains(&format!("{{{name}}}")), "{name} left in prompt");
        }
        assert!(!PLACEHOLDER.is_match(&prompt));
        assert!(prompt.contains("report for Mei, who resides in Taipei with a household of 3 members"));
        assert!(prompt.contains("123.46 kg of CO2 emissions monthly, with 20% from renewables"));
        assert!(prompt.contains("Water usage of 8500.5 liters"));
        assert!(prompt.contains("Weekly travel of 60 km using Bus, contributing to 7.20 kg"));
        assert!(prompt.contains("recycling of Paper, Glass"));
    }

    #[test]
    fn test_small_quantities_keep_precision() {
        let (mut input, breakdown) = sample();
        input.weekly_waste_kg = 0.04;
        input.commute_km = 12.25;

        let values = report_variables(&input, &breakdown);

        assert_eq!(values["weekly_waste"], "0.04");
        assert_eq!(values["weekly_travel"], "12.25");
        assert_eq!(values["water_consumption"], "8500.5");
        assert_eq!(values["family_size"], "3");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = PromptTemplate::new("Hi {nickname} from {region}", &["nickname", "region"]).unwrap();
        let values = HashMap::from([
            ("nickname", "{region}".to_string()),
            ("region", "Oslo".to_string()),
        ]);
        assert_eq!(template.render(&values).unwrap(), "Hi {region} from Oslo");
    }

    #[test]
    fn test_missing_value() {
        let template = PromptTemplate::new("Hi {nickname}", &["nickname"]).unwrap();
        assert_eq!(
            template.render(&HashMap::new()).unwrap_err(),
            PromptError::MissingVariable("nickname".to_string())
        );
    }

    #[test]
    fn test_template_validation() {
        assert_eq!(
            PromptTemplate::new("Hi {nickname} {age}", &["nickname"]).unwrap_err(),
            PromptError::UnknownPlaceholder("age".to_string())
        );
        assert_eq!(
            PromptTemplate::new("Hi {nickname}", &["nickname", "region"]).unwrap_err(),
            PromptError::UnusedVariable("region".to_string())
        );
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("greenme-prompt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.txt");
        let body = REPORT_VARIABLES
            .iter()
            .map(|v| format!("{v}={{{v}}}"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&good, body).unwrap();
        let template = PromptTemplate::from_file(&good).unwrap();
        assert_eq!(template.variables().len(), REPORT_VARIABLES.len());

        let bad = dir.join("bad.txt");
        std::fs::write(&bad, "Only {nickname}").unwrap();
        assert!(matches!(
            PromptTemplate::from_file(&bad).unwrap_err(),
            PromptError::UnusedVariable(_)
        ));

        assert!(matches!(
            PromptTemplate::from_file(dir.join("missing.txt")).unwrap_err(),
            PromptError::Io { .. }
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
