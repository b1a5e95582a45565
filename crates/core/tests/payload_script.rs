//! Runs the rendered matcher script against a minimal DOM under node.
//!
//! Skipped when no `node` binary is on `PATH`.

use std::io::Write;
use std::process::{Command, Stdio};

use autoclick::{MatcherConfig, render_payload};
use serde_json::Value;

const DOM_SHIM: &str = include_str!("support/dom_shim.js");

/// Evaluates `scenario` after the shim, with the rendered script bound to
/// `PAYLOAD`. Returns the JSON the scenario passed to `report`, or `None`
/// when node is unavailable.
fn run_scenario(config: &MatcherConfig, scenario: &str) -> Option<Value> {
	let Ok(node) = which::which("node") else {
		eprintln!("node not found, skipping payload script test");
		return None;
	};
	let payload = serde_json::to_string(&render_payload(config)).unwrap();
	let source = format!("{DOM_SHIM}\nconst PAYLOAD = {payload};\n{scenario}\n");

	let mut child = Command::new(node)
		.arg("-")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(source.as_bytes()).unwrap();
	let output = child.wait_with_output().unwrap();
	assert!(output.status.success(), "node failed: {}", String::from_utf8_lossy(&output.stderr));

	let stdout = String::from_utf8(output.stdout).unwrap();
	let line = stdout.lines().last().expect("scenario did not report");
	Some(serde_json::from_str(line).unwrap())
}

fn clicks(report: &Value) -> Vec<&str> {
	report["clicks"].as_array().unwrap().iter().map(|c| c.as_str().unwrap()).collect()
}

fn unmarked() -> MatcherConfig {
	MatcherConfig::default().without_markers()
}

#[test]
fn run_button_in_panel_is_clicked() {
	let scenario = r#"
		document.body.append(h('div', { id: 'cascade' }, h('button', {}, 'Run')));
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&MatcherConfig::default(), scenario) else { return };
	assert_eq!(report["status"], "observer-installed");
	assert_eq!(clicks(&report), ["Run"]);
}

#[test]
fn run_wins_over_always_allow() {
	let scenario = r#"
		document.body.append(h('div', { id: 'cascade' }, h('button', {}, 'Always Allow'), h('button', {}, 'Run')));
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&MatcherConfig::default(), scenario) else { return };
	assert_eq!(clicks(&report), ["Run"]);
}

#[test]
fn requires_input_step_is_revealed() {
	let scenario = r#"
		document.body.append(h('div', { class: 'chat-widget' }, h('div', {}, '1 Step Requires Input')));
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&MatcherConfig::default(), scenario) else { return };
	assert_eq!(clicks(&report), ["1 Step Requires Input"]);
}

#[test]
fn second_injection_reports_already_active() {
	let scenario = r#"
		document.body.append(h('div', { id: 'cascade' }, h('button', {}, 'Run')));
		const first = inject();
		const second = inject();
		report({ first, second });
	"#;
	let Some(report) = run_scenario(&MatcherConfig::default(), scenario) else { return };
	assert_eq!(report["first"], "observer-installed");
	assert_eq!(report["second"], "already-active");
	assert_eq!(report["observers"], 1);
	assert_eq!(clicks(&report), ["Run"]);
}

#[test]
fn disabled_loading_and_busy_buttons_are_skipped() {
	let scenario = r#"
		document.body.append(
			h('button', { disabled: '' }, 'Run'),
			h('button', { 'aria-disabled': 'true' }, 'Accept'),
			h('button', { class: 'btn loading' }, 'Allow'),
			h('button', {}, 'Approve', h('span', { class: 'animate-spin' })),
			h('button', {}, 'Confirm', h('div', { role: 'progressbar' })),
		);
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&unmarked(), scenario) else { return };
	assert_eq!(report["status"], "observer-installed");
	assert!(clicks(&report).is_empty());
}

#[test]
fn overlong_text_is_not_an_action() {
	let scenario = r#"
		document.body.append(h('button', {}, 'Run this command to continue with everything you asked for earlier'));
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&unmarked(), scenario) else { return };
	assert!(clicks(&report).is_empty());
}

#[test]
fn nothing_is_clicked_outside_a_panel() {
	let scenario = r#"
		document.body.append(h('button', {}, 'Run'));
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&MatcherConfig::default(), scenario) else { return };
	assert_eq!(report["status"], "observer-installed");
	assert!(clicks(&report).is_empty());
}

#[test]
fn astral_characters_count_once_toward_length_caps() {
	let scenario = r#"
		document.body.append(h('button', {}, 'Always Allow ' + '\u{1F600}'.repeat(20)));
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&unmarked(), scenario) else { return };
	assert_eq!(clicks(&report).len(), 1);
}

#[test]
fn shadow_roots_and_priority_targets_are_searched() {
	let scenario = r#"
		const host = h('div', {});
		host.attachShadow().append(h('div', { role: 'button', 'data-testid': 'allow-tool' }, h('span', {}, 'Yes')));
		document.body.append(host);
		report({ status: inject() });
	"#;
	let Some(report) = run_scenario(&unmarked(), scenario) else { return };
	assert_eq!(clicks(&report), ["Yes"]);
}

#[test]
fn mutation_schedules_a_throttled_scan() {
	let scenario = r#"
		const panel = h('div', { id: 'cascade' });
		document.body.append(panel);
		const status = inject();
		panel.append(h('button', {}, 'Continue'));
		mutate();
		mutate();
		setTimeout(() => {
			mutate();
			setTimeout(() => report({ status }), 300);
		}, 300);
	"#;
	let Some(report) = run_scenario(&MatcherConfig::default(), scenario) else { return };
	assert_eq!(report["status"], "observer-installed");
	// The second scan finds the same button still cooling down.
	assert_eq!(clicks(&report), ["Continue"]);
}
