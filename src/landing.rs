//! Landing page with the rotating "Patient Vitals" demo card.
//!
//! The demo card cycles through fixed samples and never calls the
//! predictor. `?demo=N` picks the first sample shown; the page then
//! rotates client-side every [`DEMO_ROTATE_SECS`].

use serde::Serialize;

use crate::config::APP_NAME;
use crate::pages::{escape_html, STYLES};
use crate::prediction::RiskLevel;
use crate::presenter::demo_color_class;

pub const DEMO_ROTATE_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemoSample {
    pub heart_rate: u16,
    pub oxygen_saturation: u8,
    pub on_oxygen: bool,
    pub risk_level: RiskLevel,
    pub assessment: &'static str,
}

impl DemoSample {
    pub fn oxygen_label(&self) -> &'static str {
        if self.on_oxygen {
            "On Oxygen"
        } else {
            "Not on Oxygen"
        }
    }

    fn oxygen_class(&self) -> &'static str {
        if self.on_oxygen {
            "text-red-400"
        } else {
            "text-green-400"
        }
    }

    fn icon(&self) -> &'static str {
        match self.risk_level {
            RiskLevel::Medium => "alert-triangle",
            RiskLevel::High => "x-circle",
            RiskLevel::Low | RiskLevel::Normal => "check-circle",
        }
    }
}

pub const DEMO_SAMPLES: [DemoSample; 4] = [
    DemoSample {
        heart_rate: 140,
        oxygen_saturation: 89,
        on_oxygen: true,
        risk_level: RiskLevel::High,
        assessment: "High Risk — Patient shows signs of respiratory distress and tachycardia.",
    },
    DemoSample {
        heart_rate: 92,
        oxygen_saturation: 96,
        on_oxygen: false,
        risk_level: RiskLevel::Medium,
        assessment: "Medium Risk — Vitals are stable but monitoring is advised.",
    },
    DemoSample {
        heart_rate: 151,
        oxygen_saturation: 92,
        on_oxygen: true,
        risk_level: RiskLevel::High,
        assessment: "High Risk — Elevated heart rate and low oxygen saturation suggest acute stress.",
    },
    DemoSample {
        heart_rate: 97,
        oxygen_saturation: 91,
        on_oxygen: false,
        risk_level: RiskLevel::Low,
        assessment: "Low Risk — Slightly low saturation but overall vitals are within safe range.",
    },
];

/// Sample shown at rotation step `index`. Wraps around.
pub fn demo_sample(index: usize) -> &'static DemoSample {
    &DEMO_SAMPLES[index % DEMO_SAMPLES.len()]
}

const FEATURES: [(&str, &str); 6] = [
    (
        "AI-Powered Analysis",
        "Machine learning algorithms trained on curated clinical datasets for simulated risk prediction.",
    ),
    (
        "Real-Time Results",
        "Get instant assessments within seconds of entering patient vitals and data.",
    ),
    (
        "Clinical Accuracy",
        "Achieves up to 95.55% accuracy in internal tests using benchmark datasets.",
    ),
    (
        "Multi-User Support",
        "Role-based access and collaborative features for teams and classrooms.",
    ),
    (
        "Privacy-Friendly",
        "No patient data stored. All assessments run locally or in secure environments.",
    ),
    (
        "Open Source",
        "Fully transparent codebase available for review, customization, and learning.",
    ),
];

fn render_demo_card(sample: &DemoSample) -> String {
    let high = sample.risk_level == RiskLevel::High;
    format!(
        r#"<div class="card" id="demo">
  <div style="display:flex;justify-content:space-between">
    <h3>Patient Vitals</h3>
    <span id="demo-oxygen" class="{oxygen_class}">{oxygen_label}</span>
  </div>
  <div class="fields">
    <div class="card"><span class="muted">Heart Rate</span><div class="headline" id="demo-hr">{hr} BPM</div></div>
    <div class="card"><span class="muted">O2 Sat</span><div class="headline" id="demo-spo2">{spo2}%</div></div>
  </div>
  <div id="demo-risk" class="risk {color}{pulse_red}" data-icon="{icon}">
    <span>Risk Assessment</span>
    <div class="headline{pulse}" id="demo-level">{risk} Risk</div>
    <div id="demo-text">{assessment}</div>
  </div>
</div>"#,
        oxygen_class = sample.oxygen_class(),
        oxygen_label = sample.oxygen_label(),
        hr = sample.heart_rate,
        spo2 = sample.oxygen_saturation,
        color = demo_color_class(sample.risk_level),
        pulse_red = if high { " animate-pulse-red" } else { "" },
        pulse = if high { " animate-pulse" } else { "" },
        icon = sample.icon(),
        risk = sample.risk_level,
        assessment = escape_html(sample.assessment),
    )
}

/// Render the landing page starting at demo sample `index`.
pub fn render_landing_page(index: usize) -> String {
    let start = index % DEMO_SAMPLES.len();
    let features: String = FEATURES
        .iter()
        .map(|(title, text)| format!(r#"<div class="card"><h3>{title}</h3><p class="muted">{text}</p></div>"#))
        .collect();
    let samples: Vec<serde_json::Value> = DEMO_SAMPLES
        .iter()
        .map(|s| {
            serde_json::json!({
                "hr": s.heart_rate,
                "spo2": s.oxygen_saturation,
                "oxygen": s.oxygen_label(),
                "oxygenClass": s.oxygen_class(),
                "risk": s.risk_level,
                "color": demo_color_class(s.risk_level),
                "text": s.assessment,
            })
        })
        .collect();
    let samples_json =
        serde_json::to_string(&samples).unwrap_or_else(|_| "[]".to_string());

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{APP_NAME}</title>
<style>{STYLES}</style>
</head>
<body>
<nav><div class="inner"><span class="brand">{APP_NAME}</span><a class="btn" href="/assessment">Start Assessment</a></div></nav>
<main>
  <div class="grid">
    <div>
      <p class="muted">AI-Powered Risk Assessment</p>
      <h1>Advanced Health Risk Prediction Platform</h1>
      <p class="muted">Harness the power of machine learning to explore how patient vital signs relate to health risk levels. This demo offers an interactive, data-driven experience designed for students, developers, and curious minds interested in clinical modeling and AI in healthcare.</p>
      <a class="btn" href="/assessment">Check Risk Level &rarr;</a>
    </div>
    {demo}
  </div>
  <h2 style="text-align:center">Why Choose {APP_NAME}?</h2>
  <div class="fields">{features}</div>
  <div class="card" style="text-align:center">
    <h2>Reimagine Health Risk Assessment</h2>
    <p class="muted">{APP_NAME} brings speed, transparency, and innovation to predictive modeling.</p>
    <a class="btn" href="/assessment">Start Risk Assessment &rarr;</a>
  </div>
</main>
<footer>
  <p class="muted"><strong>Medical Disclaimer:</strong> This tool is for educational and research purposes only. Always consult qualified healthcare professionals for medical decisions.</p>
  <p class="hint">&copy; 2025 {APP_NAME}. Advancing healthcare insights through open-source machine learning.</p>
</footer>
<script>
(function(){{
  var samples={samples_json};
  var i={start};
  function show(s){{
    document.getElementById('demo-hr').textContent=s.hr+' BPM';
    document.getElementById('demo-spo2').textContent=s.spo2+'%';
    var ox=document.getElementById('demo-oxygen');
    ox.textContent=s.oxygen;ox.className=s.oxygenClass;
    var high=s.risk==='High';
    document.getElementById('demo-risk').className='risk '+s.color+(high?' animate-pulse-red':'');
    var level=document.getElementById('demo-level');
    level.textContent=s.risk+' Risk';level.className='headline'+(high?' animate-pulse':'');
    document.getElementById('demo-text').textContent=s.text;
  }}
  setInterval(function(){{i=(i+1)%samples.length;show(samples[i]);}},{interval_ms});
}})();
</script>
</body>
</html>"##,
        demo = render_demo_card(demo_sample(start)),
        interval_ms = DEMO_ROTATE_SECS * 1000,
    )
}
