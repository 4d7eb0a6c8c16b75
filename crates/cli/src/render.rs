//! Human-readable and JSON output for profiles and history.

use std::fmt::Write as _;

use vr_domain::profile::VisualDnaProfile;
use vr_studio::{HistoryEntry, SessionState};

/// The profile as a readable breakdown, shot list included when present.
pub fn profile_text(profile: &VisualDnaProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", profile.vibe_title.to_uppercase());
    let _ = writeln!(out);

    field(&mut out, "Subject", Some(&profile.subject));
    for (label, value) in [
        ("Environment", &profile.environment),
        ("Setting", &profile.setting),
        ("Place", &profile.place),
        ("Time", &profile.time),
        ("Characters", &profile.characters),
        ("Mood", &profile.mood),
        ("Style", &profile.style),
        ("Lighting", &profile.lighting),
        ("Camera", &profile.camera),
        ("Lens", &profile.lens),
        ("Angle", &profile.angle),
        ("Motion", &profile.motion),
        ("Audio", &profile.audio),
        ("Aspect ratio", &profile.aspect_ratio),
    ] {
        field(&mut out, label, value.as_deref());
    }
    if let Some(secs) = profile.duration_seconds {
        let _ = writeln!(out, "  {:<14}{secs}s", "Duration");
    }

    let _ = writeln!(out, "\nPlot");
    for (i, point) in profile.plot_points.iter().enumerate() {
        let _ = writeln!(out, "  {}. {point}", i + 1);
    }

    let _ = writeln!(out, "\nMain prompt\n  {}", profile.main_prompt);
    if let Some(negative) = &profile.negative_prompt {
        let _ = writeln!(out, "\nNegative prompt\n  {negative}");
    }
    if !profile.tags.is_empty() {
        let tags: Vec<String> = profile.tags.iter().map(|t| format!("#{t}")).collect();
        let _ = writeln!(out, "\nTags  {}", tags.join(" "));
    }

    if let Some(shots) = &profile.variants {
        let _ = writeln!(out, "\nShots");
        for shot in shots.iter() {
            let specs = &shot.technical_specs;
            let _ = writeln!(
                out,
                "  [{}] {} ({} / {} / {})",
                shot.shot_number, shot.vibe_title, specs.angle, specs.lens, specs.motion
            );
            if let Some(focus) = &shot.action_focus {
                let _ = writeln!(out, "      focus: {focus}");
            }
            let _ = writeln!(out, "      {}", shot.main_prompt);
        }
    }

    out
}

pub fn profile_json(profile: &VisualDnaProfile) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(profile)?)
}

/// One line per entry: index, title, timestamp, and whether it was expanded.
pub fn history_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history yet.\n".into();
    }
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let expanded = if entry.profile.has_variants() { "  +shots" } else { "" };
        let _ = writeln!(
            out,
            "[{i}] {}  ({}){expanded}",
            entry.profile.vibe_title,
            entry.recorded_at.format("%Y-%m-%d %H:%M")
        );
    }
    out
}

/// Short status line for stderr after a failed request.
pub fn state_summary(state: &SessionState) -> String {
    match state.fault() {
        Some(fault) => format!("{} ({}): {}", state.name(), fault.kind, fault.message),
        None => state.name().to_string(),
    }
}

fn field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        let _ = writeln!(out, "  {label:<14}{v}");
    }
}
