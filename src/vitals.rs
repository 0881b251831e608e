//! Vital-signs form model.
//!
//! `VitalSigns` is the in-memory form state: every field is optional and
//! `None` means "not entered". `VitalsPayload` is the wire shape the
//! predictor expects (eight numeric keys). Only a complete form produces
//! a payload.

use serde::{Deserialize, Serialize, Serializer};

// ═══════════════════════════════════════════════════════════
// Fields
// ═══════════════════════════════════════════════════════════

/// One of the eight assessment inputs, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    RespiratoryRate,
    OxygenSaturation,
    O2Scale,
    OnOxygen,
    SystolicBp,
    HeartRate,
    Temperature,
    Consciousness,
}

/// Form section a field is rendered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormSection {
    Respiratory,
    Cardiovascular,
    Neurological,
}

impl FormSection {
    pub const ALL: [FormSection; 3] = [
        FormSection::Respiratory,
        FormSection::Cardiovascular,
        FormSection::Neurological,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Respiratory => "Respiratory Assessment",
            Self::Cardiovascular => "Cardiovascular Assessment",
            Self::Neurological => "Neurological Assessment",
        }
    }
}

/// Input hints for a numeric field. Not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSpec {
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub placeholder: &'static str,
    pub normal_range: &'static str,
}

impl VitalField {
    pub const ALL: [VitalField; 8] = [
        VitalField::RespiratoryRate,
        VitalField::OxygenSaturation,
        VitalField::O2Scale,
        VitalField::OnOxygen,
        VitalField::SystolicBp,
        VitalField::HeartRate,
        VitalField::Temperature,
        VitalField::Consciousness,
    ];

    /// JSON key used in the predictor request body.
    pub fn wire_key(self) -> &'static str {
        match self {
            Self::RespiratoryRate => "Respiratory_Rate",
            Self::OxygenSaturation => "Oxygen_Saturation",
            Self::O2Scale => "O2_Scale",
            Self::OnOxygen => "On_Oxygen",
            Self::SystolicBp => "Systolic_BP",
            Self::HeartRate => "Heart_Rate",
            Self::Temperature => "Temperature",
            Self::Consciousness => "Consciousness",
        }
    }

    /// Form input name (`snake_case`, same as the serde name).
    pub fn input_name(self) -> &'static str {
        match self {
            Self::RespiratoryRate => "respiratory_rate",
            Self::OxygenSaturation => "oxygen_saturation",
            Self::O2Scale => "o2_scale",
            Self::OnOxygen => "on_oxygen",
            Self::SystolicBp => "systolic_bp",
            Self::HeartRate => "heart_rate",
            Self::Temperature => "temperature",
            Self::Consciousness => "consciousness",
        }
    }

    pub fn from_input_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.input_name() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RespiratoryRate => "Respiratory Rate",
            Self::OxygenSaturation => "Oxygen Saturation",
            Self::O2Scale => "O2 Scale Assessment",
            Self::OnOxygen => "Patient on Oxygen",
            Self::SystolicBp => "Systolic Blood Pressure",
            Self::HeartRate => "Heart Rate",
            Self::Temperature => "Body Temperature",
            Self::Consciousness => "Consciousness Level (AVPU Scale)",
        }
    }

    pub fn section(self) -> FormSection {
        match self {
            Self::RespiratoryRate | Self::OxygenSaturation | Self::O2Scale | Self::OnOxygen => {
                FormSection::Respiratory
            }
            Self::SystolicBp | Self::HeartRate => FormSection::Cardiovascular,
            Self::Temperature | Self::Consciousness => FormSection::Neurological,
        }
    }

    /// Measured readings, as opposed to enumerated selections.
    pub fn is_numeric(self) -> bool {
        self.numeric_spec().is_some()
    }

    pub fn numeric_spec(self) -> Option<&'static NumericSpec> {
        const RESPIRATORY: NumericSpec = NumericSpec {
            unit: "breaths/min",
            min: 0.0,
            max: 60.0,
            step: 1.0,
            placeholder: "e.g., 16",
            normal_range: "12-20 breaths/min",
        };
        const SATURATION: NumericSpec = NumericSpec {
            unit: "%",
            min: 0.0,
            max: 100.0,
            step: 1.0,
            placeholder: "e.g., 98",
            normal_range: "95-100%",
        };
        const SYSTOLIC: NumericSpec = NumericSpec {
            unit: "mmHg",
            min: 0.0,
            max: 300.0,
            step: 1.0,
            placeholder: "e.g., 120",
            normal_range: "90-140 mmHg",
        };
        const HEART: NumericSpec = NumericSpec {
            unit: "bpm",
            min: 0.0,
            max: 300.0,
            step: 1.0,
            placeholder: "e.g., 72",
            normal_range: "60-100 bpm",
        };
        const TEMPERATURE: NumericSpec = NumericSpec {
            unit: "°C",
            min: 30.0,
            max: 45.0,
            step: 0.1,
            placeholder: "e.g., 37.0",
            normal_range: "36.1-37.2°C",
        };

        match self {
            Self::RespiratoryRate => Some(&RESPIRATORY),
            Self::OxygenSaturation => Some(&SATURATION),
            Self::SystolicBp => Some(&SYSTOLIC),
            Self::HeartRate => Some(&HEART),
            Self::Temperature => Some(&TEMPERATURE),
            Self::O2Scale | Self::OnOxygen | Self::Consciousness => None,
        }
    }

    /// Selectable `(code, label)` pairs for enumerated fields.
    pub fn choices(self) -> Vec<(u8, &'static str)> {
        match self {
            Self::O2Scale => O2Scale::ALL.iter().map(|s| (s.code(), s.label())).collect(),
            Self::OnOxygen => vec![(1, "Yes"), (0, "No")],
            Self::Consciousness => Consciousness::ALL
                .iter()
                .map(|c| (c.code(), c.label()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for VitalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ═══════════════════════════════════════════════════════════
// Enumerated selections
// ═══════════════════════════════════════════════════════════

/// O2 scale assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum O2Scale {
    Yes,
    No,
}

impl O2Scale {
    pub const ALL: [O2Scale; 2] = [O2Scale::Yes, O2Scale::No];

    pub fn code(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Yes),
            2 => Some(Self::No),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

/// AVPU consciousness level, with the Confusion variant.
///
/// Codes follow the predictor's training encoding, which is alphabetical
/// rather than clinical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consciousness {
    Alert,
    Confusion,
    Pain,
    Unresponsive,
    Verbal,
}

impl Consciousness {
    pub const ALL: [Consciousness; 5] = [
        Consciousness::Alert,
        Consciousness::Confusion,
        Consciousness::Pain,
        Consciousness::Unresponsive,
        Consciousness::Verbal,
    ];

    pub fn code(self) -> u8 {
        match self {
            Self::Alert => 0,
            Self::Confusion => 1,
            Self::Pain => 2,
            Self::Unresponsive => 3,
            Self::Verbal => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Alert => "Alert (A)",
            Self::Confusion => "Confusion (C)",
            Self::Pain => "Pain response (P)",
            Self::Unresponsive => "Unresponsive (U)",
            Self::Verbal => "Verbal (V)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Alert => "Patient is fully conscious and responsive",
            Self::Confusion => "Patient shows signs of confusion or disorientation",
            Self::Pain => "Patient responds only to painful stimuli",
            Self::Unresponsive => "Patient does not respond to any stimuli",
            Self::Verbal => "Patient responds to verbal commands",
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VitalsError {
    #[error("{field} must be a finite number")]
    NotFinite { field: VitalField },

    #[error("{field} has no option with code {code}")]
    UnknownChoice { field: VitalField, code: f64 },

    #[error("Form incomplete, missing: {}", join_labels(.missing))]
    Incomplete { missing: Vec<VitalField> },
}

fn join_labels(fields: &[VitalField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

// ═══════════════════════════════════════════════════════════
// VitalSigns: form state
// ═══════════════════════════════════════════════════════════

/// Progress shown when nothing has been entered, so the bar is never empty.
pub const BASE_PROGRESS: f64 = 7.0;

/// Vital signs as entered so far. `None` means "not entered".
///
/// A reading of zero is kept as `Some(0.0)`; it is distinguishable from
/// an empty field but does not count as filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub respiratory_rate: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub o2_scale: Option<O2Scale>,
    pub on_oxygen: Option<bool>,
    pub systolic_bp: Option<f64>,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub consciousness: Option<Consciousness>,
}

impl VitalSigns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field from its wire value. Enumerated fields take their code.
    pub fn set(&mut self, field: VitalField, value: f64) -> Result<(), VitalsError> {
        if !value.is_finite() {
            return Err(VitalsError::NotFinite { field });
        }
        let unknown = || VitalsError::UnknownChoice { field, code: value };
        let code = || -> Result<u8, VitalsError> {
            if value.fract() != 0.0 || !(0.0..=u8::MAX as f64).contains(&value) {
                return Err(unknown());
            }
            Ok(value as u8)
        };

        match field {
            VitalField::RespiratoryRate => self.respiratory_rate = Some(value),
            VitalField::OxygenSaturation => self.oxygen_saturation = Some(value),
            VitalField::SystolicBp => self.systolic_bp = Some(value),
            VitalField::HeartRate => self.heart_rate = Some(value),
            VitalField::Temperature => self.temperature = Some(value),
            VitalField::O2Scale => {
                self.o2_scale = Some(O2Scale::from_code(code()?).ok_or_else(unknown)?)
            }
            VitalField::Consciousness => {
                self.consciousness = Some(Consciousness::from_code(code()?).ok_or_else(unknown)?)
            }
            VitalField::OnOxygen => {
                self.on_oxygen = Some(match code()? {
                    0 => false,
                    1 => true,
                    _ => return Err(unknown()),
                })
            }
        }
        Ok(())
    }

    /// Reset a field to "not entered".
    pub fn clear(&mut self, field: VitalField) {
        match field {
            VitalField::RespiratoryRate => self.respiratory_rate = None,
            VitalField::OxygenSaturation => self.oxygen_saturation = None,
            VitalField::O2Scale => self.o2_scale = None,
            VitalField::OnOxygen => self.on_oxygen = None,
            VitalField::SystolicBp => self.systolic_bp = None,
            VitalField::HeartRate => self.heart_rate = None,
            VitalField::Temperature => self.temperature = None,
            VitalField::Consciousness => self.consciousness = None,
        }
    }

    /// Current wire value of a field, if entered.
    pub fn get(&self, field: VitalField) -> Option<f64> {
        match field {
            VitalField::RespiratoryRate => self.respiratory_rate,
            VitalField::OxygenSaturation => self.oxygen_saturation,
            VitalField::SystolicBp => self.systolic_bp,
            VitalField::HeartRate => self.heart_rate,
            VitalField::Temperature => self.temperature,
            VitalField::O2Scale => self.o2_scale.map(|s| f64::from(s.code())),
            VitalField::OnOxygen => self.on_oxygen.map(|on| if on { 1.0 } else { 0.0 }),
            VitalField::Consciousness => self.consciousness.map(|c| f64::from(c.code())),
        }
    }

    /// Filled predicate: readings must be positive, selections present.
    pub fn is_filled(&self, field: VitalField) -> bool {
        match self.get(field) {
            Some(v) if field.is_numeric() => v.is_finite() && v > 0.0,
            Some(_) => true,
            None => false,
        }
    }

    pub fn filled_count(&self) -> usize {
        VitalField::ALL.iter().filter(|f| self.is_filled(**f)).count()
    }

    pub fn missing_fields(&self) -> Vec<VitalField> {
        VitalField::ALL
            .into_iter()
            .filter(|f| !self.is_filled(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.filled_count() == VitalField::ALL.len()
    }

    /// Completion percentage on the `[7, 100]` scale.
    pub fn progress(&self) -> f64 {
        let total = VitalField::ALL.len() as f64;
        BASE_PROGRESS + (self.filled_count() as f64 / total) * (100.0 - BASE_PROGRESS)
    }

    /// Build the request body. Fails if any field is not filled.
    pub fn to_payload(&self) -> Result<VitalsPayload, VitalsError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(VitalsError::Incomplete { missing });
        }
        let value = |field| self.get(field).unwrap_or_default();
        Ok(VitalsPayload {
            respiratory_rate: value(VitalField::RespiratoryRate),
            oxygen_saturation: value(VitalField::OxygenSaturation),
            o2_scale: value(VitalField::O2Scale) as u8,
            systolic_bp: value(VitalField::SystolicBp),
            heart_rate: value(VitalField::HeartRate),
            temperature: value(VitalField::Temperature),
            consciousness: value(VitalField::Consciousness) as u8,
            on_oxygen: value(VitalField::OnOxygen) as u8,
        })
    }

    /// Rebuild form state from a request body.
    pub fn from_payload(payload: &VitalsPayload) -> Result<Self, VitalsError> {
        let mut vitals = Self::new();
        for field in VitalField::ALL {
            vitals.set(field, payload.value(field))?;
        }
        Ok(vitals)
    }
}

// ═══════════════════════════════════════════════════════════
// VitalsPayload: wire shape
// ═══════════════════════════════════════════════════════════

/// Request body for `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsPayload {
    #[serde(rename = "Respiratory_Rate", serialize_with = "serialize_reading")]
    pub respiratory_rate: f64,
    #[serde(rename = "Oxygen_Saturation", serialize_with = "serialize_reading")]
    pub oxygen_saturation: f64,
    #[serde(rename = "O2_Scale")]
    pub o2_scale: u8,
    #[serde(rename = "Systolic_BP", serialize_with = "serialize_reading")]
    pub systolic_bp: f64,
    #[serde(rename = "Heart_Rate", serialize_with = "serialize_reading")]
    pub heart_rate: f64,
    #[serde(rename = "Temperature", serialize_with = "serialize_reading")]
    pub temperature: f64,
    #[serde(rename = "Consciousness")]
    pub consciousness: u8,
    #[serde(rename = "On_Oxygen")]
    pub on_oxygen: u8,
}

impl VitalsPayload {
    pub fn value(&self, field: VitalField) -> f64 {
        match field {
            VitalField::RespiratoryRate => self.respiratory_rate,
            VitalField::OxygenSaturation => self.oxygen_saturation,
            VitalField::O2Scale => f64::from(self.o2_scale),
            VitalField::OnOxygen => f64::from(self.on_oxygen),
            VitalField::SystolicBp => self.systolic_bp,
            VitalField::HeartRate => self.heart_rate,
            VitalField::Temperature => self.temperature,
            VitalField::Consciousness => f64::from(self.consciousness),
        }
    }
}

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole readings go out as JSON integers (`16`, not `16.0`).
fn serialize_reading<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
