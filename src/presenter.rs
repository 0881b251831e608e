//! Risk category → display state.
//!
//! Pure lookups, no state. The class strings are the utility classes the
//! pages style against; icons are named by their lucide identifiers.

use serde::Serialize;

use crate::prediction::RiskLevel;

/// Visual tone of a display variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Info,
    Warning,
    Danger,
    Neutral,
}

/// Everything the result panel needs to render one risk category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskDisplay {
    pub tone: Tone,
    pub color_class: &'static str,
    pub icon: &'static str,
    pub headline: String,
    pub guidance: &'static str,
    /// Headline and icon pulse.
    pub pulse: bool,
    /// Show the "Immediate Action Required" sub-panel.
    pub immediate_action: bool,
}

pub const IMMEDIATE_ACTION_LABEL: &str = "Immediate Action Required";

/// Map a risk category, or its absence, to the result panel display.
pub fn present(risk: Option<RiskLevel>) -> RiskDisplay {
    let Some(risk) = risk else {
        return RiskDisplay {
            tone: Tone::Neutral,
            color_class: "text-muted-foreground bg-muted/10 border-border",
            icon: "gauge",
            headline: "Pending".to_string(),
            guidance: "Assessment pending...",
            pulse: false,
            immediate_action: false,
        };
    };

    let (tone, color_class, icon, guidance) = match risk {
        RiskLevel::Normal => (
            Tone::Success,
            "text-green-400 bg-green-500/10 border-green-500/20",
            "check-circle",
            "Patient vitals are within normal parameters. Continue routine monitoring.",
        ),
        RiskLevel::Low => (
            Tone::Info,
            "text-green-300 bg-green-500/10 border-green-500/20",
            "info",
            "Slight deviation from normal ranges. Monitor patient closely for changes.",
        ),
        RiskLevel::Medium => (
            Tone::Warning,
            "text-yellow-400 bg-yellow-500/10 border-yellow-500/20",
            "alert-triangle",
            "Moderate risk detected. Consider additional assessment and intervention.",
        ),
        RiskLevel::High => (
            Tone::Danger,
            "text-red-400 bg-red-500/10 border-red-500/20 animate-pulse-red",
            "x-circle",
            "High risk identified. Immediate medical attention and intervention required.",
        ),
    };

    RiskDisplay {
        tone,
        color_class,
        icon,
        headline: format!("{risk} Risk"),
        guidance,
        pulse: risk == RiskLevel::High,
        immediate_action: risk == RiskLevel::High,
    }
}

/// Landing-page demo card colors. The demo card has no Normal variant and
/// falls back to green.
pub fn demo_color_class(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "text-green-400 bg-green-500/10 border-green-500/20",
        RiskLevel::Medium => "text-yellow-400 bg-yellow-500/10 border-yellow-500/20",
        RiskLevel::High => "text-red-400 bg-red-500/10 border-red-500/20",
        RiskLevel::Normal => "text-green-500 bg-green-500/10 border-green-500/20",
    }
}

// ═══════════════════════════════════════════════════════════
// Assessment guidelines panel
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub tone: Tone,
    pub meaning: &'static str,
}

pub const RISK_LEGEND: [LegendEntry; 3] = [
    LegendEntry {
        label: "Normal/Low",
        tone: Tone::Success,
        meaning: "Stable condition, routine monitoring",
    },
    LegendEntry {
        label: "Medium",
        tone: Tone::Warning,
        meaning: "Enhanced monitoring required",
    },
    LegendEntry {
        label: "High",
        tone: Tone::Danger,
        meaning: "Immediate medical intervention",
    },
];

pub const CLINICAL_NOTES: [&str; 4] = [
    "Ensure all measurements are current and accurate",
    "Consider patient history and comorbidities",
    "Use clinical judgment alongside AI predictions",
    "Document all findings in patient records",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_risk_shows_immediate_action() {
        let display = present(Some(RiskLevel::High));
        assert_eq!(display.tone, Tone::Danger);
        assert_eq!(display.icon, "x-circle");
        assert_eq!(display.headline, "High Risk");
        assert!(display.immediate_action);
        assert!(display.pulse);
        assert!(display.color_class.contains("animate-pulse-red"));
    }

    #[test]
    fn only_high_risk_shows_immediate_action() {
        for risk in [RiskLevel::Normal, RiskLevel::Low, RiskLevel::Medium] {
            let display = present(Some(risk));
            assert!(!display.immediate_action, "{risk}");
            assert!(!display.pulse, "{risk}");
            assert_eq!(display.headline, format!("{risk} Risk"));
        }
    }

    #[test]
    fn each_category_has_its_own_variant() {
        let normal = present(Some(RiskLevel::Normal));
        assert_eq!(normal.icon, "check-circle");
        assert!(normal.guidance.starts_with("Patient vitals are within normal"));

        let low = present(Some(RiskLevel::Low));
        assert_eq!(low.icon, "info");
        assert_eq!(low.color_class, "text-green-300 bg-green-500/10 border-green-500/20");

        let medium = present(Some(RiskLevel::Medium));
        assert_eq!(medium.tone, Tone::Warning);
        assert!(medium.guidance.starts_with("Moderate risk detected"));
    }

    #[test]
    fn missing_category_is_pending() {
        let display = present(None);
        assert_eq!(display.tone, Tone::Neutral);
        assert_eq!(display.icon, "gauge");
        assert_eq!(display.guidance, "Assessment pending...");
        assert!(!display.immediate_action);
    }

    #[test]
    fn demo_card_high_does_not_pulse_class() {
        assert!(!demo_color_class(RiskLevel::High).contains("animate"));
        assert!(demo_color_class(RiskLevel::Normal).starts_with("text-green-500"));
    }
}
