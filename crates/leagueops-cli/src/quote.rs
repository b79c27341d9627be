//! `quote` command: run the refund engine for one cancellation.

use chrono::{DateTime, Utc};
use clap::Args;
use leagueops_core::{calculate_refund, AppConfig, OutcomeKind, RefundOutcome, RefundRequest};
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// League slug from the catalog; supplies season dates and price
    #[arg(long, conflicts_with_all = ["season_start", "off_dates"])]
    pub league: Option<String>,
    /// Season start date (M/D/YYYY or M/D/YY)
    #[arg(long)]
    pub season_start: Option<String>,
    /// Comma-separated off-dates (M/D[/YY|/YYYY])
    #[arg(long, default_value = "")]
    pub off_dates: String,
    /// Amount originally paid; defaults to the league price with --league
    #[arg(long)]
    pub cost: Option<Decimal>,
    /// Payout mode: refund or credit
    #[arg(long)]
    pub mode: Option<String>,
    /// RFC 3339 submission time; defaults to now
    #[arg(long)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl QuoteArgs {
    pub(crate) fn to_request(&self) -> RefundRequest {
        RefundRequest {
            season_start_date: self.season_start.clone(),
            off_dates: self.off_dates.clone(),
            original_cost: self.cost,
            mode: self.mode.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Build the request (from flags or the league catalog), calculate, and print.
///
/// # Errors
///
/// Returns an error if the league catalog cannot be loaded, the league is
/// unknown, or the calculation rejected its input.
pub(crate) fn run_quote(config: &AppConfig, args: &QuoteArgs) -> anyhow::Result<()> {
    let request = match args.league.as_deref() {
        Some(slug) => {
            let catalog = leagueops_core::load_leagues(&config.leagues_path)?;
            let league = catalog
                .find(slug)
                .ok_or_else(|| anyhow::anyhow!("unknown league '{slug}'"))?;
            league.refund_request(
                args.mode.as_deref().unwrap_or_default(),
                args.cost,
                args.submitted_at,
            )
        }
        None => args.to_request(),
    };

    let outcome = calculate_refund(&request);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", render_outcome(&outcome));
    }

    if outcome.is_invalid_input() {
        anyhow::bail!("{}", outcome.explanation);
    }
    Ok(())
}

/// Human-readable summary of an outcome for terminal output.
pub(crate) fn render_outcome(outcome: &RefundOutcome) -> String {
    let headline = match &outcome.kind {
        OutcomeKind::Tier {
            mode,
            tier,
            percentage,
            ..
        } => format!(
            "{mode}: ${:.2} ({percentage}%, tier {tier})",
            outcome.refund_amount
        ),
        OutcomeKind::NoPayment => "no payment: $0.00".to_string(),
        OutcomeKind::AfterFinalWeek => "past week 5: $0.00".to_string(),
        OutcomeKind::InvalidInput { .. } => "not calculated".to_string(),
    };
    format!("{headline}\n{}", outcome.explanation)
}
