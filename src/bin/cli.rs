//! Keiba CLI - rank and explain race entrants from a JSON race card

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use keiba::config::ScoringConfig;
use keiba::data::{load_race_card, HistoryCache, RaceCard};
use keiba::predictor::{FieldPredictor, RankedEntrant};

#[derive(Parser)]
#[command(name = "keiba")]
#[command(author, version, about = "Horse race entrant scoring CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scoring config JSON (defaults to the built-in set)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every entrant of a race card
    Rank {
        /// Race card JSON
        card: PathBuf,

        /// Print the ranking as JSON
        #[arg(long)]
        json: bool,

        /// Number of entrants to show
        #[arg(long)]
        top: Option<usize>,
    },

    /// Explain the score of one entrant (or all of them)
    Explain {
        /// Race card JSON
        card: PathBuf,

        /// Horse name or horse number
        #[arg(long)]
        horse: Option<String>,

        /// Include raw sub-scores and diagnostic notes
        #[arg(long)]
        full: bool,
    },

    /// Show running styles and the predicted pace
    Pace {
        /// Race card JSON
        card: PathBuf,
    },

    /// Print the active scoring config as JSON
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Rank { card, json, top } => run_rank(&card, config, json, top),
        Commands::Explain { card, horse, full } => run_explain(&card, config, horse.as_deref(), full),
        Commands::Pace { card } => run_pace(&card, config),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScoringConfig> {
    match path {
        Some(path) => {
            let config = ScoringConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?;
            info!("Using scoring config {} from {:?}", config.version, path);
            Ok(config)
        }
        None => Ok(ScoringConfig::default()),
    }
}

/// Load a card; a card without a race date is scored as of today
fn load_card(path: &Path) -> Result<RaceCard> {
    let mut card =
        load_race_card(path).with_context(|| format!("Failed to load race card from {:?}", path))?;
    if card.race.race_date.is_none() {
        let today = Local::now().date_naive();
        info!("No race date on the card, using {}", today);
        card.race.race_date = Some(today);
    }
    Ok(card)
}

fn print_header(card: &RaceCard) {
    let race = &card.race;
    println!(
        "{} {} {}{}m {} ({} runners)",
        card.race_name.cyan().bold(),
        race.course,
        race.surface.label(),
        race.distance,
        race.condition.label(),
        card.field_size()
    );
    println!();
}

fn run_rank(path: &Path, config: ScoringConfig, json: bool, top: Option<usize>) -> Result<()> {
    let card = load_card(path)?;
    let ranked = FieldPredictor::new(config).rank(&card);
    let shown = &ranked[..top.unwrap_or(ranked.len()).min(ranked.len())];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    print_header(&card);
    println!(
        "{:>4} {:>4} {:<18} {:<6} {:>7} {:>7} {:>7} {:>7}",
        "順位", "馬番", "馬名", "脚質", "総合", "上がり", "距離", "コース"
    );
    println!("{}", "-".repeat(72));

    for r in shown {
        let total = format!("{:>7.1}", r.breakdown.total);
        let total = if r.breakdown.total >= 0.0 {
            total.green()
        } else {
            total.red()
        };
        println!(
            "{:>4} {:>4} {:<18} {:<6} {} {:>7.1} {:>7.1} {:>7.1}",
            r.rank,
            r.entrant.horse_no,
            truncate_name(&r.entrant.name, 18),
            r.style.style.label(),
            total,
            r.breakdown.sectional,
            r.breakdown.distance,
            r.breakdown.course
        );
        for flag in &r.breakdown.danger_flags {
            println!("{:>10} {}", "", format!("! {}", flag.label()).yellow());
        }
    }
    Ok(())
}

/// Entrant by horse number or exact name
fn find_entrant<'a>(ranked: &'a [RankedEntrant], key: &str) -> Option<&'a RankedEntrant> {
    match key.trim().parse::<u8>() {
        Ok(no) => ranked.iter().find(|r| r.entrant.horse_no == no),
        Err(_) => ranked.iter().find(|r| r.entrant.name == key.trim()),
    }
}

fn run_explain(path: &Path, config: ScoringConfig, horse: Option<&str>, full: bool) -> Result<()> {
    let card = load_card(path)?;
    let ranked = FieldPredictor::new(config).rank(&card);

    let selected: Vec<&RankedEntrant> = match horse {
        Some(key) => match find_entrant(&ranked, key) {
            Some(r) => vec![r],
            None => bail!("No entrant {:?} on the card", key),
        },
        None => ranked.iter().collect(),
    };

    print_header(&card);
    for r in selected {
        println!(
            "{} {} {}",
            format!("{}.", r.rank).bold(),
            format!("[{}]", r.entrant.horse_no).dimmed(),
            r.entrant.name.yellow().bold()
        );
        print!("{}", r.breakdown.explain(full));
        println!();
    }
    Ok(())
}

fn run_pace(path: &Path, config: ScoringConfig) -> Result<()> {
    let card = load_card(path)?;
    let predictor = FieldPredictor::new(config);
    let mut cache = HistoryCache::new();
    let analysis = predictor.analyze(&card, &mut cache);

    print_header(&card);
    println!("{:>4} {:<18} {:<6} {:>6}", "馬番", "馬名", "脚質", "確度");
    println!("{}", "-".repeat(40));
    for (entry, style) in card.entries.iter().zip(analysis.styles.iter()) {
        println!(
            "{:>4} {:<18} {:<6} {:>6.2}",
            entry.entrant.horse_no,
            truncate_name(&entry.entrant.name, 18),
            style.style.label(),
            style.confidence
        );
    }
    println!();

    let pace = &analysis.pace;
    let counts = &pace.counts;
    println!(
        "{} {} (front ratio {:.2}, straight {}m)",
        "Pace:".yellow().bold(),
        pace.pace.label().bold(),
        pace.front_ratio,
        pace.straight_length
    );
    println!(
        "  逃げ {} / 先行 {} / 差し {} / 追込 {}",
        counts.frontrunner, counts.stalker, counts.closer, counts.deep_closer
    );
    Ok(())
}

/// Truncate name to fit display width
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        name.to_string()
    } else {
        chars[..max_len - 1].iter().collect::<String>() + "…"
    }
}
