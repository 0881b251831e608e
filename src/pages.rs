//! Server-rendered assessment page.
//!
//! The page is a plain HTML form posting back to `/assessment/:id`; the
//! small inline script only mirrors the progress bar and the submit
//! control's enabled state while the user types. Every decision is made
//! again on the server.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::config::APP_NAME;
use crate::core_state::SessionSnapshot;
use crate::presenter::{self, IMMEDIATE_ACTION_LABEL, RISK_LEGEND};
use crate::probe::MODAL_TITLE;
use crate::vitals::{Consciousness, FormSection, VitalField, BASE_PROGRESS};

pub const SUBMIT_LABEL: &str = "Generate Risk Assessment";
pub const SUBMIT_BUSY_LABEL: &str = "Analyzing Patient Data...";
pub const PROBE_LABEL: &str = "Predict";

/// Shared stylesheet for the landing and assessment pages. Utility class
/// names match the presenter's `color_class` strings.
pub(crate) const STYLES: &str = r#"
*,*::before,*::after{box-sizing:border-box}
body{margin:0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#0b1120;color:#e2e8f0;line-height:1.5}
a{color:inherit}
nav{border-bottom:1px solid #1e293b;background:rgba(15,23,42,.6);position:sticky;top:0}
nav .inner{max-width:1120px;margin:0 auto;padding:0 24px;height:64px;display:flex;justify-content:space-between;align-items:center}
.brand{font-weight:700;font-size:1.25rem}
main{max-width:1120px;margin:0 auto;padding:32px 24px}
.grid{display:grid;grid-template-columns:2fr 1fr;gap:32px}
@media (max-width:900px){.grid{grid-template-columns:1fr}}
.card{background:#111827;border:1px solid #1e293b;border-radius:16px;padding:24px;margin-bottom:24px}
.muted,.text-muted-foreground{color:#94a3b8}
.hint{font-size:.75rem;color:#94a3b8;margin:4px 0 0}
.section{margin-bottom:32px}
.section h3{font-size:1.1rem;margin:0 0 16px}
.fields{display:grid;grid-template-columns:1fr 1fr;gap:16px}
label{display:block;font-size:.875rem;font-weight:500;margin-bottom:6px}
input,select{width:100%;padding:10px 12px;border-radius:8px;border:1px solid #334155;background:#0f172a;color:inherit}
.btn{display:inline-block;padding:12px 20px;border:none;border-radius:10px;font-weight:600;cursor:pointer;text-decoration:none;background:#14b8a6;color:#04201d}
.btn[disabled]{opacity:.5;cursor:not-allowed}
.btn-block{display:block;width:100%;font-size:1.05rem;padding:16px}
.btn-secondary{background:#1e293b;color:#e2e8f0}
.progress{height:8px;border-radius:4px;background:#1e293b;overflow:hidden}
.progress>div{height:100%;background:#14b8a6}
.alert{border:1px solid rgba(239,68,68,.4);background:rgba(239,68,68,.1);color:#fca5a5;border-radius:12px;padding:16px;margin-bottom:24px}
.risk{border-width:2px;border-style:solid;border-radius:12px;padding:24px}
.risk .headline{font-size:1.9rem;font-weight:700;margin:8px 0}
.action{background:rgba(239,68,68,.2);border:1px solid rgba(239,68,68,.3);border-radius:8px;padding:12px;margin-top:16px;color:#f87171;font-weight:500}
.legend div{display:flex;gap:8px;align-items:baseline;padding:6px 8px;border-radius:8px;margin-bottom:6px}
.modal-backdrop{position:fixed;inset:0;background:rgba(0,0,0,.6);display:flex;align-items:center;justify-content:center}
.modal{background:#111827;border:1px solid #334155;border-radius:16px;max-width:420px;width:90%;padding:24px}
footer{border-top:1px solid #1e293b;padding:32px 24px;text-align:center;font-size:.875rem}
.text-green-300{color:#86efac}.text-green-400{color:#4ade80}.text-green-500{color:#22c55e}
.text-yellow-400{color:#facc15}.text-red-400{color:#f87171}
.bg-green-500\/10{background:rgba(34,197,94,.1)}.bg-yellow-500\/10{background:rgba(234,179,8,.1)}
.bg-red-500\/10{background:rgba(239,68,68,.1)}.bg-muted\/10{background:rgba(148,163,184,.1)}
.border-green-500\/20{border-color:rgba(34,197,94,.2)}.border-yellow-500\/20{border-color:rgba(234,179,8,.2)}
.border-red-500\/20{border-color:rgba(239,68,68,.2)}.border-border{border-color:#1e293b}
.animate-pulse,.animate-pulse-red{animation:pulse 2s ease-in-out infinite}
@keyframes pulse{50%{opacity:.6}}
"#;

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

// ═══════════════════════════════════════════════════════════
// Form posts
// ═══════════════════════════════════════════════════════════

/// Which control posted the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    /// Store the field values only.
    Save,
    Submit,
    Probe,
    Dismiss,
}

impl FormAction {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "save" => Some(Self::Save),
            "submit" => Some(Self::Submit),
            "probe" => Some(Self::Probe),
            "dismiss" => Some(Self::Dismiss),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub action: FormAction,
    /// Fields present in the post. `None` clears the field.
    pub updates: Vec<(VitalField, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("Unknown form action: {0}")]
    UnknownAction(String),

    #[error("{field} is not a number: {raw}")]
    NotANumber { field: VitalField, raw: String },
}

/// Decode an urlencoded assessment form. Unknown keys are ignored.
pub fn parse_form(form: &HashMap<String, String>) -> Result<FormSubmission, FormError> {
    let action = match form.get("action").map(|a| a.trim()) {
        None | Some("") => FormAction::Save,
        Some(raw) => FormAction::parse(raw).ok_or_else(|| FormError::UnknownAction(raw.into()))?,
    };

    let mut updates = Vec::new();
    for field in VitalField::ALL {
        let Some(raw) = form.get(field.input_name()) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            updates.push((field, None));
            continue;
        }
        let value = raw.parse::<f64>().map_err(|_| FormError::NotANumber {
            field,
            raw: raw.to_string(),
        })?;
        updates.push((field, Some(value)));
    }

    Ok(FormSubmission { action, updates })
}

// ═══════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════

fn select_placeholder(field: VitalField) -> &'static str {
    match field {
        VitalField::O2Scale => "Select O2 scale",
        VitalField::OnOxygen => "Select oxygen status",
        _ => "Select consciousness level",
    }
}

fn render_field(field: VitalField, value: Option<f64>) -> String {
    let name = field.input_name();
    let label = field.label();

    if let Some(spec) = field.numeric_spec() {
        let value = value.map(|v| v.to_string()).unwrap_or_default();
        return format!(
            r#"<div>
  <label for="{name}">{label} <span class="muted">({unit})</span></label>
  <input id="{name}" name="{name}" type="number" data-kind="reading" min="{min}" max="{max}" step="{step}" placeholder="{placeholder}" value="{value}">
  <p class="hint">Normal range: {range}</p>
</div>"#,
            unit = spec.unit,
            min = spec.min,
            max = spec.max,
            step = spec.step,
            placeholder = spec.placeholder,
            range = spec.normal_range,
        );
    }

    let mut options = format!(
        r#"<option value="">{}</option>"#,
        select_placeholder(field)
    );
    for (code, choice) in field.choices() {
        let selected = if value == Some(f64::from(code)) {
            " selected"
        } else {
            ""
        };
        let text = match Consciousness::from_code(code).filter(|_| field == VitalField::Consciousness) {
            Some(level) => format!("{choice}: {}", level.description()),
            None => choice.to_string(),
        };
        let _ = write!(options, r#"<option value="{code}"{selected}>{text}</option>"#);
    }
    format!(
        r#"<div>
  <label for="{name}">{label}</label>
  <select id="{name}" name="{name}" data-kind="choice">{options}</select>
</div>"#
    )
}

fn render_sections(snap: &SessionSnapshot) -> String {
    let mut html = String::new();
    for section in FormSection::ALL {
        let fields: String = VitalField::ALL
            .into_iter()
            .filter(|f| f.section() == section)
            .map(|f| render_field(f, snap.state.vitals.get(f)))
            .collect();
        let _ = write!(
            html,
            r#"<div class="section"><h3>{title}</h3><div class="fields">{fields}</div></div>"#,
            title = section.title(),
        );
    }
    html
}

fn render_error(snap: &SessionSnapshot) -> String {
    match &snap.state.error {
        Some(message) => format!(
            r#"<div class="alert" role="alert">{}</div>"#,
            escape_html(message)
        ),
        None => String::new(),
    }
}

fn render_result(snap: &SessionSnapshot) -> String {
    let Some(display) = snap.state.result_display() else {
        return String::new();
    };
    let pulse = if display.pulse { " animate-pulse" } else { "" };
    let action = if display.immediate_action {
        format!(r#"<div class="action animate-pulse">{IMMEDIATE_ACTION_LABEL}</div>"#)
    } else {
        String::new()
    };
    format!(
        r#"<div class="card" id="result">
  <h2>Risk Assessment Result</h2>
  <div class="risk {color}">
    <div class="muted" data-icon="{icon}">Just now</div>
    <div class="headline{pulse}">{headline}</div>
    <p>{guidance}</p>
    {action}
  </div>
</div>"#,
        color = display.color_class,
        icon = display.icon,
        headline = escape_html(&display.headline),
        guidance = display.guidance,
    )
}

fn render_guidelines() -> String {
    let legend: String = RISK_LEGEND
        .iter()
        .map(|entry| {
            let color = match entry.tone {
                presenter::Tone::Warning => "text-yellow-400 bg-yellow-500/10",
                presenter::Tone::Danger => "text-red-400 bg-red-500/10",
                _ => "text-green-400 bg-green-500/10",
            };
            format!(
                r#"<div class="{color}"><strong>{label}:</strong><span class="muted">{meaning}</span></div>"#,
                label = entry.label,
                meaning = entry.meaning,
            )
        })
        .collect();
    let notes: String = presenter::CLINICAL_NOTES
        .iter()
        .map(|note| format!("<li>{note}</li>"))
        .collect();
    format!(
        r#"<div class="card">
  <h2>Assessment Guidelines</h2>
  <h4>Risk Level Interpretation:</h4>
  <div class="legend">{legend}</div>
  <h4>Clinical Notes:</h4>
  <ul class="hint">{notes}</ul>
</div>"#
    )
}

fn render_modal(snap: &SessionSnapshot, action: &str) -> String {
    if !snap.probe.open {
        return String::new();
    }
    format!(
        r#"<div class="modal-backdrop" role="dialog" aria-modal="true">
  <div class="modal">
    <h3>{MODAL_TITLE}</h3>
    <p>{message}</p>
    <form method="post" action="{action}"><button class="btn btn-secondary" name="action" value="dismiss">Close</button></form>
  </div>
</div>"#,
        message = escape_html(&snap.probe.message),
    )
}

/// Render the assessment page for one session.
pub fn render_assessment_page(snap: &SessionSnapshot) -> String {
    let state = &snap.state;
    let action = format!("/assessment/{}", snap.id);
    let progress = state.progress();
    let submit_label = if state.is_busy() {
        SUBMIT_BUSY_LABEL
    } else {
        SUBMIT_LABEL
    };
    let submit_disabled = if state.can_submit() { "" } else { " disabled" };
    let probe_disabled = if snap.probe_in_flight { " disabled" } else { "" };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Health Risk Assessment · {APP_NAME}</title>
<style>{STYLES}</style>
</head>
<body>
<nav><div class="inner"><a href="/">&larr; Back to Home</a><span class="brand">{APP_NAME}</span></div></nav>
<main>
  <header style="text-align:center;max-width:640px;margin:0 auto 32px">
    <h1>Health Risk Assessment</h1>
    <p class="muted">Enter patient vital signs for AI-powered risk analysis and clinical decision support</p>
    <div style="display:flex;justify-content:space-between" class="muted"><span>Form Progress</span><span id="progress-label">{progress_label}%</span></div>
    <div class="progress"><div id="progress-bar" style="width:{progress}%"></div></div>
  </header>
  <div class="grid">
    <div>
      <div class="card">
        <h2>Patient Vital Signs Assessment</h2>
        <p class="muted">Complete all fields for accurate risk prediction. All measurements should reflect current patient status.</p>
        <form id="vitals" method="post" action="{action}">
          {sections}
          <button class="btn btn-block" id="submit" name="action" value="submit"{submit_disabled}>{submit_label}</button>
          <p style="text-align:center;margin-top:16px"><button class="btn btn-secondary" name="action" value="probe"{probe_disabled}>{PROBE_LABEL}</button></p>
        </form>
      </div>
    </div>
    <div>
      {error}
      {guidelines}
      {result}
    </div>
  </div>
</main>
{modal}
<footer>
  <p class="muted"><strong>Medical Disclaimer:</strong> This AI assessment tool is for clinical decision support only. Always use professional medical judgment and follow institutional protocols.</p>
  <p class="hint">{APP_NAME} v2.0 - Built for healthcare excellence</p>
</footer>
<script>
(function(){{
  var form=document.getElementById('vitals');
  var fields=form.querySelectorAll('[data-kind]');
  var busy={busy};
  function filled(el){{
    if(el.value==='')return false;
    return el.dataset.kind==='choice'||Number(el.value)>0;
  }}
  function update(){{
    var n=0;fields.forEach(function(el){{if(filled(el))n++;}});
    var pct={base}+(n/fields.length)*(100-{base});
    document.getElementById('progress-bar').style.width=pct+'%';
    document.getElementById('progress-label').textContent=Math.round(pct)+'%';
    document.getElementById('submit').disabled=busy||n!==fields.length;
  }}
  fields.forEach(function(el){{el.addEventListener('input',update);el.addEventListener('change',update);}});
}})();
</script>
</body>
</html>"##,
        progress_label = progress.round(),
        sections = render_sections(snap),
        error = render_error(snap),
        guidelines = render_guidelines(),
        result = render_result(snap),
        modal = render_modal(snap, &action),
        busy = state.is_busy(),
        base = BASE_PROGRESS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{reduce, Action, AssessmentState};
    use crate::prediction::{PredictionError, PredictionResult, RiskLevel};
    use crate::probe::{ProbeFailure, ProbeModal, ProbeOutcome, TIMEOUT_MESSAGE};
    use crate::vitals::tests::complete_vitals;
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot(state: AssessmentState) -> SessionSnapshot {
        SessionSnapshot {
            id: Uuid::new_v4(),
            state,
            probe: ProbeModal::default(),
            probe_in_flight: false,
            created_at: Utc::now(),
        }
    }

    fn ready() -> AssessmentState {
        AssessmentState {
            vitals: complete_vitals(),
            ..AssessmentState::new()
        }
    }

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<script>"x" & 'y'</script>"#),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn parse_form_reads_fields_and_action() {
        let parsed = parse_form(&form(&[
            ("heart_rate", "88"),
            ("temperature", " 37.4 "),
            ("consciousness", ""),
            ("unrelated", "x"),
            ("action", "submit"),
        ]))
        .unwrap();
        assert_eq!(parsed.action, FormAction::Submit);
        assert_eq!(
            parsed.updates,
            vec![
                (VitalField::HeartRate, Some(88.0)),
                (VitalField::Temperature, Some(37.4)),
                (VitalField::Consciousness, None),
            ]
        );
    }

    #[test]
    fn parse_form_defaults_to_save() {
        assert_eq!(parse_form(&form(&[])).unwrap().action, FormAction::Save);
    }

    #[test]
    fn parse_form_rejects_garbage() {
        assert_eq!(
            parse_form(&form(&[("action", "launch")])).unwrap_err(),
            FormError::UnknownAction("launch".into())
        );
        assert!(matches!(
            parse_form(&form(&[("heart_rate", "fast")])).unwrap_err(),
            FormError::NotANumber {
                field: VitalField::HeartRate,
                ..
            }
        ));
    }

    #[test]
    fn empty_page_has_disabled_submit_and_base_progress() {
        let html = render_assessment_page(&snapshot(AssessmentState::new()));
        assert!(html.contains("Health Risk Assessment"));
        assert!(html.contains("Patient Vital Signs Assessment"));
        assert!(html.contains(r#"id="progress-label">7%"#));
        assert!(html.contains(&format!(r#"value="submit" disabled>{SUBMIT_LABEL}"#)));
        assert!(!html.contains("Risk Assessment Result"));
        assert!(!html.contains(r#"class="modal-backdrop" role="dialog""#));
    }

    #[test]
    fn complete_form_enables_submit_and_keeps_values() {
        let html = render_assessment_page(&snapshot(ready()));
        assert!(html.contains(&format!(r#"value="submit">{SUBMIT_LABEL}"#)));
        assert!(html.contains(r#"id="progress-label">100%"#));
        assert!(html.contains(r#"name="temperature" type="number""#));
        assert!(html.contains(r#"value="37.4""#));
        assert!(html.contains(r#"<option value="0" selected>Alert"#));
    }

    #[test]
    fn busy_page_shows_analyzing_label() {
        let submitting = reduce(&ready(), Action::Submit).unwrap();
        let html = render_assessment_page(&snapshot(submitting));
        assert!(html.contains(&format!("disabled>{SUBMIT_BUSY_LABEL}")));
    }

    #[test]
    fn high_result_renders_immediate_action() {
        let submitting = reduce(&ready(), Action::Submit).unwrap();
        let done = reduce(
            &submitting,
            Action::Resolved(Ok(PredictionResult {
                risk_level: RiskLevel::High,
            })),
        )
        .unwrap();
        let html = render_assessment_page(&snapshot(done));
        assert!(html.contains("High Risk"));
        assert!(html.contains(IMMEDIATE_ACTION_LABEL));
        assert!(html.contains("animate-pulse-red"));
    }

    #[test]
    fn error_is_escaped_into_alert() {
        let submitting = reduce(&ready(), Action::Submit).unwrap();
        let failed = reduce(
            &submitting,
            Action::Resolved(Err(PredictionError::Transport("<b>offline</b>".into()))),
        )
        .unwrap();
        let html = render_assessment_page(&snapshot(failed));
        assert!(html.contains(r#"role="alert">&lt;b&gt;offline&lt;/b&gt;"#));
    }

    #[test]
    fn open_modal_renders_title_and_message() {
        let mut snap = snapshot(AssessmentState::new());
        snap.probe
            .apply(&ProbeOutcome::Failed(ProbeFailure::Timeout));
        let html = render_assessment_page(&snap);
        assert!(html.contains(r#"class="modal-backdrop" role="dialog""#));
        assert!(html.contains(MODAL_TITLE));
        assert!(html.contains(&escape_html(TIMEOUT_MESSAGE)));
        assert!(html.contains(r#"value="dismiss""#));
    }
}
