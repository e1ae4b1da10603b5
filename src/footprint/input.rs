use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_NICKNAME: &str = "GreenMe user";
const DEFAULT_REGION: &str = "an unspecified region";

#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} {reason}")]
    OutOfRange { field: &'static str, reason: &'static str },

    #[error("unknown transport mode: {0:?}")]
    UnknownTransport(String),

    #[error("unknown recycled material: {0:?}")]
    UnknownMaterial(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Car,
    Bike,
    Bus,
    Train,
    ElectricVehicle,
}

impl TransportMode {
    pub const ALL: [TransportMode; 5] = [
        TransportMode::Car,
        TransportMode::Bike,
        TransportMode::Bus,
        TransportMode::Train,
        TransportMode::ElectricVehicle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransportMode::Car => "Car",
            TransportMode::Bike => "Bike",
            TransportMode::Bus => "Bus",
            TransportMode::Train => "Train",
            TransportMode::ElectricVehicle => "Electric Vehicle",
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Bike => "bike",
            TransportMode::Bus => "bus",
            TransportMode::Train => "train",
            TransportMode::ElectricVehicle => "electric_vehicle",
        }
    }
}

impl FromStr for TransportMode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| {
                mode.label().eq_ignore_ascii_case(needle) || mode.id().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| InputError::UnknownTransport(s.to_string()))
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecycleMaterial {
    Plastic,
    Glass,
    Paper,
    #[serde(rename = "e_waste")]
    EWaste,
    Other,
}

impl RecycleMaterial {
    pub const ALL: [RecycleMaterial; 5] = [
        RecycleMaterial::Plastic,
        RecycleMaterial::Glass,
        RecycleMaterial::Paper,
        RecycleMaterial::EWaste,
        RecycleMaterial::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RecycleMaterial::Plastic => "Plastic",
            RecycleMaterial::Glass => "Glass",
            RecycleMaterial::Paper => "Paper",
            RecycleMaterial::EWaste => "E-waste",
            RecycleMaterial::Other => "Other",
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            RecycleMaterial::Plastic => "plastic",
            RecycleMaterial::Glass => "glass",
            RecycleMaterial::Paper => "paper",
            RecycleMaterial::EWaste => "e_waste",
            RecycleMaterial::Other => "other",
        }
    }
}

impl FromStr for RecycleMaterial {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(needle) || m.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| InputError::UnknownMaterial(s.to_string()))
    }
}

impl fmt::Display for RecycleMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifestyle answers collected by the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifestyleInput {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub region: String,
    #[serde(default = "default_family_size")]
    pub family_size: u32,
    /// Monthly electricity use in kWh.
    #[serde(default)]
    pub energy_kwh: f64,
    /// Share of renewables, percent.
    #[serde(default)]
    pub renewable_ratio: u8,
    /// Monthly water use in litres.
    #[serde(default)]
    pub water_liters: f64,
    /// Weekly commute distance in km.
    #[serde(default)]
    pub commute_km: f64,
    #[serde(default)]
    pub transport_mode: TransportMode,
    #[serde(default)]
    pub weekly_waste_kg: f64,
    #[serde(default)]
    pub recycled: Vec<RecycleMaterial>,
}

fn default_family_size() -> u32 {
    1
}

impl Default for LifestyleInput {
    fn default() -> Self {
        Self {
            nickname: String::new(),
            region: String::new(),
            family_size: default_family_size(),
            energy_kwh: 0.0,
            renewable_ratio: 0,
            water_liters: 0.0,
            commute_km: 0.0,
            transport_mode: TransportMode::default(),
            weekly_waste_kg: 0.0,
            recycled: Vec::new(),
        }
    }
}

impl LifestyleInput {
    /// Builds an input from url-encoded form pairs. The recycled multiselect
    /// arrives as repeated `recycle` keys.
    pub fn from_form_pairs(pairs: &[(String, String)]) -> Result<Self, InputError> {
        let mut input = Self::default();

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "nickname" => input.nickname = value.to_string(),
                "region" => input.region = value.to_string(),
                "family_size" if !value.is_empty() => {
                    input.family_size = parse_number::<u32>("family_size", value)?
                }
                "energy_kwh" if !value.is_empty() => {
                    input.energy_kwh = parse_number("energy_kwh", value)?
                }
                "renewable_ratio" if !value.is_empty() => {
                    let ratio: u32 = parse_number("renewable_ratio", value)?;
                    input.renewable_ratio = u8::try_from(ratio).map_err(|_| {
                        InputError::OutOfRange {
                            field: "renewable_ratio",
                            reason: "must be between 0 and 100",
                        }
                    })?;
                }
                "water_liters" if !value.is_empty() => {
                    input.water_liters = parse_number("water_liters", value)?
                }
                "commute_km" if !value.is_empty() => {
                    input.commute_km = parse_number("commute_km", value)?
                }
                "transport_mode" if !value.is_empty() => input.transport_mode = value.parse()?,
                "weekly_waste_kg" if !value.is_empty() => {
                    input.weekly_waste_kg = parse_number("weekly_waste_kg", value)?
                }
                "recycle" if !value.is_empty() => input.recycled.push(value.parse()?),
                _ => {}
            }
        }

        input.validate()
    }

    /// Applies the form's range rules and fills defaults for blank text.
    pub fn validate(mut self) -> Result<Self, InputError> {
        self.nickname = self.nickname.trim().to_string();
        self.region = self.region.trim().to_string();
        if self.nickname.is_empty() {
            self.nickname = DEFAULT_NICKNAME.to_string();
        }
        if self.region.is_empty() {
            self.region = DEFAULT_REGION.to_string();
        }

        if self.family_size < 1 {
            return Err(InputError::OutOfRange {
                field: "family_size",
                reason: "must be at least 1",
            });
        }
        if self.renewable_ratio > 100 {
            return Err(InputError::OutOfRange {
                field: "renewable_ratio",
                reason: "must be between 0 and 100",
            });
        }

        let quantities = [
            ("energy_kwh", self.energy_kwh),
            ("water_liters", self.water_liters),
            ("commute_km", self.commute_km),
            ("weekly_waste_kg", self.weekly_waste_kg),
        ];
        for (field, value) in quantities {
            if !value.is_finite() {
                return Err(InputError::OutOfRange {
                    field,
                    reason: "must be a finite number",
                });
            }
            if value < 0.0 {
                return Err(InputError::OutOfRange {
                    field,
                    reason: "must not be negative",
                });
            }
        }

        let mut seen = Vec::with_capacity(self.recycled.len());
        for material in self.recycled.drain(..) {
            if !seen.contains(&material) {
                seen.push(material);
            }
        }
        self.recycled = seen;

        Ok(self)
    }

    /// "Plastic, Glass", or "none" when nothing is recycled.
    pub fn recycled_label(&self) -> String {
        if self.recycled.is_empty() {
            return "none".to_string();
        }
        self.recycled
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, InputError> {
    value.parse().map_err(|_| InputError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_full_form() {
        let input = LifestyleInput::from_form_pairs(&pairs(&[
            ("nickname", " Mei "),
            ("region", "Taipei"),
            ("family_size", "4"),
            ("energy_kwh", "320.5"),
            ("renewable_ratio", "35"),
            ("water_liters", "9000"),
            ("commute_km", "80"),
            ("transport_mode", "Electric Vehicle"),
            ("weekly_waste_kg", "6.5"),
            ("recycle", "Plastic"),
            ("recycle", "e_waste"),
        ]))
        .unwrap();

        assert_eq!(input.nickname, "Mei");
        assert_eq!(input.family_size, 4);
        assert_eq!(input.energy_kwh, 320.5);
        assert_eq!(input.renewable_ratio, 35);
        assert_eq!(input.transport_mode, TransportMode::ElectricVehicle);
        assert_eq!(input.recycled, vec![RecycleMaterial::Plastic, RecycleMaterial::EWaste]);
        assert_eq!(input.recycled_label(), "Plastic, E-waste");
    }

    #[test]
    fn test_blank_form_uses_defaults() {
        let input = LifestyleInput::from_form_pairs(&pairs(&[
            ("nickname", ""),
            ("energy_kwh", ""),
        ]))
        .unwrap();

        assert_eq!(input.nickname, DEFAULT_NICKNAME);
        assert_eq!(input.region, DEFAULT_REGION);
        assert_eq!(input.family_size, 1);
        assert_eq!(input.energy_kwh, 0.0);
        assert_eq!(input.transport_mode, TransportMode::Car);
        assert_eq!(input.recycled_label(), "none");
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let err = LifestyleInput::from_form_pairs(&pairs(&[("energy_kwh", "lots")])).unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidNumber {
                field: "energy_kwh",
                value: "lots".to_string()
            }
        );

        let err = LifestyleInput::from_form_pairs(&pairs(&[("commute_km", "-3")])).unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "commute_km", .. }));

        let err = LifestyleInput::from_form_pairs(&pairs(&[("water_liters", "NaN")])).unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "water_liters", .. }));

        let err = LifestyleInput::from_form_pairs(&pairs(&[("family_size", "0")])).unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "family_size", .. }));

        let err = LifestyleInput::from_form_pairs(&pairs(&[("renewable_ratio", "140")])).unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "renewable_ratio", .. }));

        let err = LifestyleInput::from_form_pairs(&pairs(&[("renewable_ratio", "900")])).unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "renewable_ratio", .. }));
    }

    #[test]
    fn test_rejects_unknown_choices() {
        let err = LifestyleInput::from_form_pairs(&pairs(&[("transport_mode", "Horse")])).unwrap_err();
        assert_eq!(err, InputError::UnknownTransport("Horse".to_string()));

        let err = LifestyleInput::from_form_pairs(&pairs(&[("recycle", "Wood")])).unwrap_err();
        assert_eq!(err, InputError::UnknownMaterial("Wood".to_string()));
    }

    #[test]
    fn test_duplicate_materials_collapse() {
        let input = LifestyleInput::from_form_pairs(&pairs(&[
            ("recycle", "glass"),
            ("recycle", "Glass"),
            ("recycle", "paper"),
        ]))
        .unwrap();
        assert_eq!(input.recycled, vec![RecycleMaterial::Glass, RecycleMaterial::Paper]);
    }

    #[test]
    fn test_json_shape() {
        let input: LifestyleInput = serde_json::from_str(
            r#"{"nickname":"Sam","energy_kwh":100,"transport_mode":"electric_vehicle","recycled":["e_waste"]}"#,
        )
        .unwrap();
        assert_eq!(input.family_size, 1);
        assert_eq!(input.transport_mode, TransportMode::ElectricVehicle);
        assert_eq!(input.recycled, vec![RecycleMaterial::EWaste]);
    }
}
