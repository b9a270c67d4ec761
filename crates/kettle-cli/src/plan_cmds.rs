//! CLI handlers for the plan pipeline.
//!
//! Implements:
//! - `kettle normalize <text>`  -- expand shorthand
//! - `kettle detect <text>`     -- detect the workout format and notation
//! - `kettle parse [text]`      -- structure an existing plan with the model
//! - `kettle generate`          -- write a new plan for a profile
//! - `kettle validate <file>`   -- check a plan JSON file

use std::io::Read as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::json;

use kettle_core::adapter::{
    GenerateAdapter, ParseAdapter, PlanFile, PreparedInput, mime_type_for_path,
};
use kettle_core::dictionary::Dictionary;
use kettle_core::normalize::{identify_colloquial_terms, resolve_abbreviations};
use kettle_core::notation::{detect_workout_format, scan_notation};
use kettle_core::plan::{WeeklyPlan, decode_plan, estimate_day_minutes, extract_json};
use kettle_core::profile::{SessionLength, UserProfile};
use kettle_core::retry::{Audit, AuditContext, PgAuditSink, RetryOutcome, run_with_retry};
use kettle_core::validate::{RawValidationContext, ValidationContext, validate_plan};
use kettle_db::pool;

use crate::config::{ModelConfig, resolve_db};
use crate::{OutputArgs, ProfileArgs, ValidationArgs};

// -----------------------------------------------------------------------
// Shared helpers
// -----------------------------------------------------------------------

/// The positional text, or stdin when it is `-` or absent.
fn read_text(text: Option<&str>) -> Result<String> {
    match text {
        Some("-") | None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read plan text from stdin")?;
            Ok(buf)
        }
        Some(text) => Ok(text.to_string()),
    }
}

impl ValidationArgs {
    pub fn to_context(&self) -> ValidationContext {
        let raw = RawValidationContext {
            sport: self.sport.clone(),
            sport_priority_exercises: self.priority.clone(),
            desired_frequency: self.frequency.clone(),
            preferred_session_length: self.session_length.clone(),
        };
        ValidationContext::from_raw(&raw).with_library_priorities()
    }
}

impl ProfileArgs {
    pub fn to_profile(&self) -> Result<UserProfile> {
        let mut profile = UserProfile::new(&self.goal, &self.experience, self.frequency);
        profile.sex = self.sex.clone();
        profile.equipment = self.equipment.clone();
        profile.pain_points = self.pain.clone();
        profile.sport = self.sport.clone();
        profile.additional_notes = self.notes.clone();
        profile.session_length = self
            .session_length
            .as_deref()
            .map(str::parse::<SessionLength>)
            .transpose()?;
        Ok(profile)
    }
}

fn print_plan_summary(plan: &WeeklyPlan) {
    println!("Plan: {}", plan.name);
    println!();
    for day in &plan.weekly_plan {
        if day.is_rest_day() || day.blocks.is_empty() {
            println!("  {:<10} {}", day.weekday_name(), day.focus);
            continue;
        }
        let exercises = day.exercises().count();
        println!(
            "  {:<10} {} ({} blocks, {} exercises, ~{} min)",
            day.weekday_name(),
            day.focus,
            day.blocks.len(),
            exercises,
            estimate_day_minutes(day)
        );
    }
}

fn emit_outcome(outcome: &RetryOutcome, output: &OutputArgs) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(&outcome.plan).context("failed to serialize plan")?;

    if let Some(path) = &output.output {
        std::fs::write(path, &rendered)
            .with_context(|| format!("failed to write plan to {}", path.display()))?;
    }

    if output.json {
        println!("{rendered}");
    } else {
        print_plan_summary(&outcome.plan);
        println!();
        println!("Accepted after {} attempt(s).", outcome.attempts);
        if let Some(path) = &output.output {
            println!("Written to {}", path.display());
        }
    }

    if !outcome.warnings.is_empty() {
        eprintln!("Warnings:");
        for w in &outcome.warnings {
            eprintln!("  - {w}");
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// kettle normalize / detect
// -----------------------------------------------------------------------

pub fn cmd_normalize(text: Option<&str>, json_out: bool) -> Result<()> {
    let text = read_text(text)?;
    let dict = Dictionary::builtin();
    let normalized = resolve_abbreviations(dict, &text);

    if json_out {
        let colloquial = identify_colloquial_terms(dict, &text);
        let body = json!({ "normalized": normalized, "colloquial": colloquial });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{normalized}");
    }
    Ok(())
}

pub fn cmd_detect(text: Option<&str>, json_out: bool) -> Result<()> {
    let text = read_text(text)?;
    let format = detect_workout_format(&text);
    let cues = scan_notation(&text);

    if json_out {
        let body = json!({
            "format": format,
            "description": format.description(),
            "cues": cues,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Format: {format} ({})", format.description());
    if !cues.is_empty() {
        println!("Notation:");
        for cue in &cues {
            println!("  - {cue}");
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// kettle parse
// -----------------------------------------------------------------------

/// Text files are read into the plan text; everything else is sent as
/// inline data.
fn load_files(paths: &[std::path::PathBuf]) -> Result<(String, Vec<PlanFile>)> {
    let mut text = String::new();
    let mut files = Vec::new();
    for path in paths {
        let mime = mime_type_for_path(path)
            .with_context(|| format!("unsupported plan file type: {}", path.display()))?;
        if mime.starts_with("text/") {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read plan file: {}", path.display()))?;
            text.push_str(&content);
            text.push('\n');
        } else {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read plan file: {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            files.push(PlanFile::new(name, mime, data));
        }
    }
    Ok((text, files))
}

pub async fn cmd_parse(
    text: Option<&str>,
    file_paths: &[std::path::PathBuf],
    thinking: bool,
    validation: &ValidationArgs,
    output: &OutputArgs,
) -> Result<()> {
    let (mut plan_text, files) = load_files(file_paths)?;
    if text.is_some() || file_paths.is_empty() {
        plan_text.push_str(&read_text(text)?);
    }
    if plan_text.trim().is_empty() && files.is_empty() {
        bail!("nothing to parse: pass plan text, `-` for stdin, or --file");
    }

    let config = ModelConfig::resolve(None)?;
    let input = PreparedInput::new(Dictionary::builtin(), &plan_text);
    let adapter = ParseAdapter::new(Arc::new(config.client()), input)
        .with_files(files)
        .with_model(config.parse_model.clone())
        .with_thinking(thinking);

    let outcome = run_with_retry(&adapter, &validation.to_context(), None).await?;
    emit_outcome(&outcome, output)
}

// -----------------------------------------------------------------------
// kettle generate
// -----------------------------------------------------------------------

pub async fn cmd_generate(
    cli_db_url: Option<&str>,
    cli_model: Option<&str>,
    profile_args: &ProfileArgs,
    output: &OutputArgs,
) -> Result<()> {
    let profile = profile_args.to_profile()?;
    let config = ModelConfig::resolve(cli_model)?;

    let adapter = GenerateAdapter::new(Arc::new(config.client()), profile.clone())
        .with_model_override(config.model.as_deref());
    tracing::info!(model = %adapter.choice().model, "selected generation model");

    // The audit log is optional: generation proceeds without a database.
    let db_pool = if profile_args.no_audit {
        None
    } else {
        match pool::create_pool(&resolve_db(cli_db_url)).await {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(error = %e, "audit log unavailable (best-effort)");
                None
            }
        }
    };
    let sink = db_pool.clone().map(PgAuditSink::new);
    let audit = sink.as_ref().map(|sink| Audit {
        sink,
        context: AuditContext::for_profile(&profile, profile_args.user_id.clone()),
    });

    let result = run_with_retry(&adapter, &ValidationContext::for_profile(&profile), audit.as_ref()).await;
    if let Some(p) = db_pool {
        p.close().await;
    }
    emit_outcome(&result?, output)
}

// -----------------------------------------------------------------------
// kettle validate
// -----------------------------------------------------------------------

pub fn read_plan_file(path: &Path) -> Result<WeeklyPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file: {}", path.display()))?;
    let value = extract_json(&content)
        .with_context(|| format!("failed to read JSON from {}", path.display()))?;
    decode_plan(value).with_context(|| format!("{} is not a valid plan", path.display()))
}

/// Returns whether the plan is valid.
pub fn cmd_validate(path: &Path, validation: &ValidationArgs, json_out: bool) -> Result<bool> {
    let plan = read_plan_file(path)?;
    let result = validate_plan(&plan, &validation.to_context());

    if json_out {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(result.valid);
    }

    print_plan_summary(&plan);
    println!();
    if result.valid {
        println!("Plan is valid.");
    } else {
        println!("Errors ({}):", result.errors.len());
        for e in &result.errors {
            println!("  - {e}");
        }
    }
    if !result.warnings.is_empty() {
        println!("Warnings ({}):", result.warnings.len());
        for w in &result.warnings {
            println!("  - {w}");
        }
    }
    Ok(result.valid)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
