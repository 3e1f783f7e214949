mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use sixdown_game::Weather;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    BatchReport, FileLoader, Prepared, expand_iterations, plan_jobs, resolve_seed_inputs,
    run_batch, simulate_one,
};

#[derive(Parser, Debug)]
#[command(name = "sixdown-tester")]
#[command(about = "Batch simulation and determinism checks for the sixdown game engine")]
struct Args {
    /// Matchup JSON (rosters and identities); the demo matchup when omitted
    #[arg(long)]
    matchup: Option<PathBuf>,

    /// Engine configuration JSON; engine defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Partial configuration merged over the base config
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Seeds to run (comma-separated integers, ranges like 10..20, or game codes)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Consecutive seeds to run from each listed seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Weather label (clear, rain, snow, wind, heat) or `all`
    #[arg(long, default_value = "clear")]
    weather: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the first game's play-by-play after the report
    #[arg(long)]
    play_by_play: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let weathers = parse_weather(&args.weather)?;
    let seed_tokens = split_csv(&args.seeds);
    let seeds = expand_iterations(&resolve_seed_inputs(&seed_tokens)?, args.iterations);
    let loader = FileLoader {
        matchup: args.matchup.clone(),
        config: args.config.clone(),
        overlay: args.overlay.clone(),
    };
    let prepared = Prepared::load(&loader).context("failed to load matchup inputs")?;
    let jobs = plan_jobs(&seeds, &weathers);

    if args.verbose {
        eprintln!(
            "🏈 {} vs {}: {} games across {} weather(s)",
            prepared.matchup.home.name,
            prepared.matchup.away.name,
            jobs.len(),
            weathers.len()
        );
    }
    log::info!("running {} games", jobs.len());

    let report = run_batch(&prepared, &jobs);

    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_report(&args, &mut output_target, &report, start_time)?;

    if args.play_by_play
        && let Some(job) = jobs.first()
    {
        match simulate_one(&prepared, job) {
            Ok(result) => {
                writeln!(output_target)?;
                logic::reports::write_play_by_play(&mut output_target, &result)?;
            }
            Err(err) => log::warn!("play-by-play unavailable: {err}"),
        }
    }
    output_target.flush_inner()?;

    if !report.passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    eprintln!("{}", "🏈 Sixdown Batch Tester".bright_cyan().bold());
    eprintln!("{}", "=======================".cyan());
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_weather(input: &str) -> Result<Vec<Weather>> {
    if input.trim().eq_ignore_ascii_case("all") {
        return Ok(Weather::ALL.to_vec());
    }
    let mut weathers = Vec::new();
    for token in split_csv(input) {
        let Some(weather) = Weather::from_label(&token) else {
            bail!("Unknown weather: {token}");
        };
        if !weathers.contains(&weather) {
            weathers.push(weather);
        }
    }
    if weathers.is_empty() {
        weathers.push(Weather::Clear);
    }
    Ok(weathers)
}

fn write_report(
    args: &Args,
    output_target: &mut OutputTarget,
    report: &BatchReport,
    start_time: Instant,
) -> Result<()> {
    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(output_target.writer(), report),
        "markdown" => logic::reports::generate_markdown_report(output_target.writer(), report),
        _ => logic::reports::generate_console_report(
            output_target.writer(),
            report,
            start_time.elapsed(),
        ),
    }
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_a_ten_game_clear_batch() {
        let args = Args::parse_from(["sixdown-tester"]);
        assert_eq!(args.seeds, "1337");
        assert_eq!(args.iterations, 10);
        assert_eq!(parse_weather(&args.weather).unwrap(), vec![Weather::Clear]);
        assert_eq!(args.report, "console");
    }

    #[test]
    fn weather_lists_parse() {
        assert_eq!(parse_weather("ALL").unwrap().len(), 5);
        assert_eq!(
            parse_weather("snow, rain,snow").unwrap(),
            vec![Weather::Snow, Weather::Rain]
        );
        assert!(parse_weather("hail").is_err());
    }

    #[test]
    fn unknown_report_format_is_rejected() {
        assert!(Args::try_parse_from(["sixdown-tester", "--report", "csv"]).is_err());
    }

    #[test]
    fn csv_splitting_drops_blanks() {
        assert_eq!(split_csv(" 1, ,SD-BLITZ07,"), vec!["1", "SD-BLITZ07"]);
    }

    #[test]
    fn output_target_writes_files() {
        let path = std::env::temp_dir().join(format!("sixdown-out-{}", std::process::id()));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        write!(target, "hello").unwrap();
        target.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        std::fs::remove_file(path).ok();
    }
}
