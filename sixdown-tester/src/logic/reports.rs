use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use sixdown_game::{GameResult, TeamSide};
use std::io::Write;
use std::time::Duration;

use super::batch::{BatchReport, Spread};

fn winner_label(winner: Option<TeamSide>) -> &'static str {
    winner.map_or("tie", TeamSide::label)
}

fn spread(s: Spread) -> String {
    format!("{:.2} ± {:.2}", s.mean, s.std_dev)
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &BatchReport,
    total_duration: Duration,
) -> Result<()> {
    let summary = &report.summary;
    writeln!(out)?;
    writeln!(out, "{}", "📊 Batch Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "================".cyan())?;
    writeln!(out, "Games completed: {}", summary.games.to_string().green())?;
    writeln!(out, "Games aborted: {}", summary.failures.to_string().red())?;
    writeln!(
        out,
        "Results: home {} / away {} / tie {}",
        summary.home_wins, summary.away_wins, summary.ties
    )?;
    writeln!(out, "Points per game: {}", spread(summary.points))?;
    writeln!(out, "Plays per game: {}", spread(summary.plays))?;
    writeln!(out, "Kick share: {}", spread(summary.kick_share))?;
    writeln!(out, "Turnovers per game: {}", spread(summary.turnovers))?;
    writeln!(out, "Bonus possessions: {}", spread(summary.bonus_possessions))?;
    writeln!(out, "Total time: {total_duration:?}")?;

    if let Some(check) = &report.determinism {
        let status = if check.matched() {
            "✅ replay matched".green()
        } else {
            "❌ replay diverged".red()
        };
        writeln!(
            out,
            "Determinism: {status} (seed {}, {}, {})",
            check.seed,
            check.weather.label(),
            check.first
        )?;
    }
    writeln!(out)?;

    for record in &report.records {
        writeln!(
            out,
            "{} {:>20} {:<5} {:>3}-{:<3} {:<4} plays {:>3} digest {}",
            "✅".green(),
            record.code.bold(),
            record.weather.label(),
            record.home_points,
            record.away_points,
            winner_label(record.winner),
            record.plays,
            record.digest
        )?;
    }

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "❌ Aborted games".bright_red().bold())?;
        for failure in &report.failures {
            let at = failure
                .play_index
                .map_or_else(|| "before kickoff".to_string(), |i| format!("at play {i}"));
            writeln!(
                out,
                "   • {} ({}) {at}: {}",
                failure.code,
                failure.weather.label(),
                failure.message.red()
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    generated_at: String,
    passed: bool,
    #[serde(flatten)]
    report: &'a BatchReport,
}

pub fn generate_json_report(out: &mut dyn Write, report: &BatchReport) -> Result<()> {
    let envelope = JsonEnvelope {
        generated_at: Utc::now().to_rfc3339(),
        passed: report.passed(),
        report,
    };
    serde_json::to_writer_pretty(&mut *out, &envelope)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &BatchReport) -> Result<()> {
    let summary = &report.summary;
    writeln!(out, "# Sixdown Batch Results\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M UTC"))?;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Games completed**: {}", summary.games)?;
    writeln!(out, "- **Games aborted**: {}", summary.failures)?;
    writeln!(
        out,
        "- **Results**: home {} / away {} / tie {}",
        summary.home_wins, summary.away_wins, summary.ties
    )?;
    writeln!(out, "- **Points per game**: {}", spread(summary.points))?;
    writeln!(out, "- **Plays per game**: {}", spread(summary.plays))?;
    writeln!(out, "- **Kick share**: {}", spread(summary.kick_share))?;
    writeln!(out, "- **Turnovers per game**: {}", spread(summary.turnovers))?;
    writeln!(
        out,
        "- **Bonus possessions**: {}",
        spread(summary.bonus_possessions)
    )?;
    if let Some(check) = &report.determinism {
        let status = if check.matched() { "✅" } else { "❌" };
        writeln!(out, "- **Determinism**: {status} seed {}", check.seed)?;
    }
    writeln!(out)?;

    writeln!(out, "## Games\n")?;
    writeln!(out, "| Code | Weather | Home | Away | Winner | Plays | Digest |")?;
    writeln!(out, "|------|---------|------|------|--------|-------|--------|")?;
    for r in &report.records {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | `{}` |",
            r.code,
            r.weather.label(),
            r.home_points,
            r.away_points,
            winner_label(r.winner),
            r.plays,
            r.digest
        )?;
    }

    if !report.failures.is_empty() {
        writeln!(out, "\n## Aborted\n")?;
        for failure in &report.failures {
            writeln!(out, "- `{}`: {}", failure.code, failure.message)?;
        }
    }
    Ok(())
}

fn clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Write a full game as a play-by-play listing.
pub fn write_play_by_play(out: &mut dyn Write, result: &GameResult) -> Result<()> {
    writeln!(
        out,
        "{} {} vs {} ({}, {})",
        "🏟".bold(),
        result.teams.home.name.bold(),
        result.teams.away.name.bold(),
        result.code,
        result.weather.label()
    )?;
    for play in &result.plays {
        let situation = if play.kick_mode {
            format!("{}&{} kick", play.down, play.distance)
        } else {
            format!("{}&{}", play.down, play.distance)
        };
        let line = format!(
            "Q{} {} {:<4} {:<9} @{:>2} {:<60} {:>3}-{:<3}",
            play.quarter,
            clock(play.clock),
            play.offense.label(),
            situation,
            play.spot,
            play.description,
            play.score_after.home,
            play.score_after.away
        );
        if play.outcome.is_turnover() {
            writeln!(out, "{}", line.yellow())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    writeln!(
        out,
        "Final: {} {} - {} {}",
        result.teams.home.name, result.score.home, result.score.away, result.teams.away.name
    )?;
    Ok(())
}
