//! `schedule` and `leagues` commands.

use clap::{Args, Subcommand};
use leagueops_core::{
    parse_off_dates, parse_season_date, AppConfig, LeagueConfig, WeekSchedule,
};

#[derive(Debug, Subcommand)]
pub(crate) enum LeaguesCommands {
    /// List leagues in the catalog with their season start and price
    List,
}

#[derive(Debug, Args)]
pub(crate) struct ScheduleArgs {
    /// League slug from the catalog
    #[arg(
        long,
        conflicts_with_all = ["season_start", "off_dates"],
        required_unless_present = "season_start"
    )]
    pub league: Option<String>,
    /// Season start date (M/D/YYYY or M/D/YY)
    #[arg(long)]
    pub season_start: Option<String>,
    /// Comma-separated off-dates (M/D[/YY|/YYYY])
    #[arg(long, default_value = "")]
    pub off_dates: String,
}

pub(crate) fn run_schedule(config: &AppConfig, args: &ScheduleArgs) -> anyhow::Result<()> {
    let schedule = match (args.league.as_deref(), args.season_start.as_deref()) {
        (Some(slug), _) => {
            let catalog = leagueops_core::load_leagues(&config.leagues_path)?;
            catalog
                .find(slug)
                .ok_or_else(|| anyhow::anyhow!("unknown league '{slug}'"))?
                .schedule()?
        }
        (None, Some(raw)) => {
            let start = parse_season_date(raw)?;
            WeekSchedule::with_off_dates(start, &parse_off_dates(&args.off_dates, start))
        }
        (None, None) => anyhow::bail!("either --league or --season-start is required"),
    };

    print!("{}", render_schedule(&schedule));
    Ok(())
}

pub(crate) fn run_leagues_list(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = leagueops_core::load_leagues(&config.leagues_path)?;
    if catalog.leagues.is_empty() {
        println!("no leagues configured in {}", config.leagues_path.display());
        return Ok(());
    }

    for league in &catalog.leagues {
        print!("{}", render_league(league));
    }
    Ok(())
}

/// Catalog entry for `leagues list`, with any notes on an indented second line.
pub(crate) fn render_league(league: &LeagueConfig) -> String {
    let price = league
        .price
        .map_or_else(|| "\u{2014}".to_string(), |p| format!("${p:.2}"));
    let off = if league.off_dates.is_empty() {
        "none"
    } else {
        league.off_dates.as_str()
    };
    let mut line = format!(
        "{:<32} starts {:<10} off: {:<24} price: {price}\n",
        league.slug(),
        league.season_start_date,
        off
    );
    if let Some(notes) = league.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        line.push_str("    ");
        line.push_str(notes.trim());
        line.push('\n');
    }
    line
}

/// One line per boundary, e.g. `week 1        Mon 2025-10-20`.
pub(crate) fn render_schedule(schedule: &WeekSchedule) -> String {
    schedule
        .labeled()
        .map(|(label, at)| format!("{label:<13} {}\n", at.format("%a %Y-%m-%d")))
        .collect()
}
