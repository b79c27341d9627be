//! Tiered refund and store-credit calculation.
//!
//! A request is placed into one of six tiers by comparing its submission time
//! against the season's [`WeekSchedule`]. Earlier requests earn a higher
//! percentage of the original payment; once week 5 has started nothing is
//! owed. Every path, including invalid input, produces a [`RefundOutcome`].

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::dates::{parse_off_dates, parse_season_date, DateParseError};
use crate::schedule::{WeekSchedule, BOUNDARY_COUNT};

/// Flat fee withheld from cash refunds, in percent of the original cost.
pub const PROCESSING_FEE_PERCENT: u8 = 5;

/// Prefix shared by every explanation for a calculation that could not run.
pub const INVALID_INPUT_MARKER: &str = "Refund could not be calculated:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundMode {
    Refund,
    Credit,
}

impl RefundMode {
    /// Processing fee withheld in this mode, if any.
    #[must_use]
    pub fn processing_fee_percent(self) -> Option<u8> {
        match self {
            RefundMode::Refund => Some(PROCESSING_FEE_PERCENT),
            RefundMode::Credit => None,
        }
    }

    fn payout_phrase(self) -> &'static str {
        match self {
            RefundMode::Refund => "a refund",
            RefundMode::Credit => "store credit",
        }
    }
}

impl std::fmt::Display for RefundMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundMode::Refund => write!(f, "refund"),
            RefundMode::Credit => write!(f, "credit"),
        }
    }
}

impl FromStr for RefundMode {
    type Err = RefundInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refund" => Ok(RefundMode::Refund),
            "credit" => Ok(RefundMode::Credit),
            "" => Err(RefundInputError::MissingMode),
            _ => Err(RefundInputError::UnknownMode(s.trim().to_string())),
        }
    }
}

/// Reasons a calculation could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefundInputError {
    #[error("season start date is missing")]
    MissingSeasonStart,

    #[error("season start date is invalid: {0}")]
    InvalidSeasonStart(#[from] DateParseError),

    #[error("original cost is missing")]
    MissingOriginalCost,

    #[error("original cost {0} is negative")]
    NegativeCost(Decimal),

    #[error("original cost {0} is too large to calculate")]
    CostOutOfRange(Decimal),

    #[error("refund mode is missing")]
    MissingMode,

    #[error("unrecognized refund mode \"{0}\"; expected \"refund\" or \"credit\"")]
    UnknownMode(String),
}

impl Serialize for RefundInputError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Percentage paid out and penalty applied for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierRule {
    pub percentage: u8,
    pub penalty_percentage: u8,
}

const fn tier(percentage: u8, penalty_percentage: u8) -> TierRule {
    TierRule {
        percentage,
        penalty_percentage,
    }
}

const REFUND_TIERS: [TierRule; BOUNDARY_COUNT] = [
    tier(95, 0),
    tier(90, 5),
    tier(80, 15),
    tier(70, 25),
    tier(60, 35),
    tier(50, 45),
];

const CREDIT_TIERS: [TierRule; BOUNDARY_COUNT] = [
    tier(100, 0),
    tier(95, 5),
    tier(85, 15),
    tier(75, 25),
    tier(65, 35),
    tier(55, 45),
];

/// Tier table for `mode`, indexed like [`WeekSchedule::boundaries`].
#[must_use]
pub fn tier_table(mode: RefundMode) -> &'static [TierRule; BOUNDARY_COUNT] {
    match mode {
        RefundMode::Refund => &REFUND_TIERS,
        RefundMode::Credit => &CREDIT_TIERS,
    }
}

/// Raw inputs for one calculation, as supplied by the order source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    /// `M/D/YYYY` or `M/D/YY`.
    pub season_start_date: Option<String>,
    /// Comma-separated `M/D[/YY|/YYYY]` tokens; may be empty.
    #[serde(default)]
    pub off_dates: String,
    pub original_cost: Option<Decimal>,
    /// `"refund"` or `"credit"`.
    pub mode: Option<String>,
    /// Defaults to the current time when absent.
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The request landed in a tier and is owed a share of the payment.
    Tier {
        mode: RefundMode,
        /// 0 for the early cutoff, 1..=5 for the week boundaries.
        tier: usize,
        percentage: u8,
        penalty_percentage: u8,
        processing_fee_percentage: Option<u8>,
    },
    /// Nothing was paid, so nothing is owed.
    NoPayment,
    /// Submitted at or after the start of week 5.
    AfterFinalWeek,
    /// The calculation could not run.
    InvalidInput { reason: RefundInputError },
}

/// Result of a calculation: the amount owed plus reviewer-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundOutcome {
    /// Rounded half-even to cents.
    pub refund_amount: Decimal,
    pub explanation: String,
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

impl RefundOutcome {
    fn no_payment() -> Self {
        Self {
            refund_amount: to_cents(Decimal::ZERO),
            explanation: "No payment was made for this order, so there is nothing to refund ($0.00)."
                    .to_string(),
            kind: OutcomeKind::NoPayment,
        }
    }

    fn after_final_week() -> Self {
        Self {
            refund_amount: to_cents(Decimal::ZERO),
            explanation: "Request was submitted after week 5 had already started, \
                          so no refund or credit is available ($0.00)."
                .to_string(),
            kind: OutcomeKind::AfterFinalWeek,
        }
    }

    fn invalid(reason: RefundInputError) -> Self {
        Self {
            refund_amount: to_cents(Decimal::ZERO),
            explanation: format!("{INVALID_INPUT_MARKER} {reason}."),
            kind: OutcomeKind::InvalidInput { reason },
        }
    }

    /// `true` when the calculation could not run.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.kind, OutcomeKind::InvalidInput { .. })
    }

    /// Percentage of the original cost paid out, or `None` for zero outcomes.
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        match self.kind {
            OutcomeKind::Tier { percentage, .. } => Some(percentage),
            _ => None,
        }
    }
}

/// Calculate a refund, using the current time when the request carries no
/// submission timestamp.
#[must_use]
pub fn calculate_refund(request: &RefundRequest) -> RefundOutcome {
    calculate_refund_at(request, Utc::now())
}

/// Calculate a refund with an explicit clock reading for `now`.
///
/// `now` is only consulted when `request.submitted_at` is `None`.
#[must_use]
pub fn calculate_refund_at(request: &RefundRequest, now: DateTime<Utc>) -> RefundOutcome {
    let submitted_at = request.submitted_at.unwrap_or(now);
    match evaluate(request, submitted_at) {
        Ok(outcome) => outcome,
        Err(reason) => {
            tracing::info!(%reason, "refund calculation rejected input");
            RefundOutcome::invalid(reason)
        }
    }
}

fn evaluate(
    request: &RefundRequest,
    submitted_at: DateTime<Utc>,
) -> Result<RefundOutcome, RefundInputError> {
    let original_cost = request
        .original_cost
        .ok_or(RefundInputError::MissingOriginalCost)?;
    let mode: RefundMode = request
        .mode
        .as_deref()
        .ok_or(RefundInputError::MissingMode)?
        .parse()?;

    if original_cost.is_zero() {
        return Ok(RefundOutcome::no_payment());
    }
    if original_cost.is_sign_negative() {
        return Err(RefundInputError::NegativeCost(original_cost));
    }

    let raw_start = request
        .season_start_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RefundInputError::MissingSeasonStart)?;
    let season_start = parse_season_date(raw_start)?;
    let off_dates = parse_off_dates(&request.off_dates, season_start);
    let schedule = WeekSchedule::with_off_dates(season_start, &off_dates);

    Ok(quote_for_schedule(&schedule, mode, original_cost, submitted_at))
}

/// Price a request against an already-built schedule.
///
/// Callers that hold a parsed league (see [`crate::leagues`]) use this to skip
/// string parsing. `original_cost` is expected to be non-negative.
#[must_use]
pub fn quote_for_schedule(
    schedule: &WeekSchedule,
    mode: RefundMode,
    original_cost: Decimal,
    submitted_at: DateTime<Utc>,
) -> RefundOutcome {
    if original_cost.is_zero() {
        return RefundOutcome::no_payment();
    }

    let Some(index) = schedule.tier_index(submitted_at) else {
        tracing::debug!(
            %submitted_at,
            final_week = %schedule.final_week_start(),
            "request after week 5 started"
        );
        return RefundOutcome::after_final_week();
    };

    let rule = tier_table(mode)[index];
    let Some(share) = original_cost
        .checked_mul(Decimal::from(rule.percentage))
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
    else {
        let reason = RefundInputError::CostOutOfRange(original_cost);
        tracing::info!(%reason, "refund calculation rejected input");
        return RefundOutcome::invalid(reason);
    };
    let refund_amount = to_cents(share);

    tracing::debug!(
        %mode,
        tier = index,
        percentage = rule.percentage,
        amount = %refund_amount,
        "computed refund tier"
    );

    RefundOutcome {
        refund_amount,
        explanation: explain(mode, index, rule, refund_amount, original_cost),
        kind: OutcomeKind::Tier {
            mode,
            tier: index,
            percentage: rule.percentage,
            penalty_percentage: rule.penalty_percentage,
            processing_fee_percentage: mode.processing_fee_percent(),
        },
    }
}

/// Round half-even to two decimal places and keep the scale at exactly two.
fn to_cents(amount: Decimal) -> Decimal {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    cents.rescale(2);
    cents
}

fn timing_phrase(index: usize) -> String {
    match index {
        0 => "more than 2 weeks before week 1".to_string(),
        1 => "before week 1".to_string(),
        n => format!("after the start of week {}", n - 1),
    }
}

fn explain(
    mode: RefundMode,
    index: usize,
    rule: TierRule,
    amount: Decimal,
    original_cost: Decimal,
) -> String {
    let fee = match mode.processing_fee_percent() {
        Some(fee) => format!(" plus a {fee}% processing fee"),
        None => String::new(),
    };
    format!(
        "Request was submitted {timing}. Eligible for {payout} of ${amount:.2} \
         ({pct}% of ${original_cost:.2}): {penalty}% penalty{fee}.",
        timing = timing_phrase(index),
        payout = mode.payout_phrase(),
        pct = rule.percentage,
        penalty = rule.penalty_percentage,
    )
}
