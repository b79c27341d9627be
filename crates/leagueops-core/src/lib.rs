//! Refund and store-credit calculation for league registrations.
//!
//! The engine in [`refund`] is pure: every input is passed explicitly and the
//! result is always a [`RefundOutcome`] value, including for bad input. The
//! remaining modules cover date parsing, the week schedule, the league
//! catalog, and application configuration shared by the binaries.

pub mod app_config;
pub mod config;
pub mod dates;
pub mod error;
pub mod leagues;
pub mod refund;
pub mod schedule;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use dates::{parse_off_dates, parse_season_date, DateParseError};
pub use error::ConfigError;
pub use leagues::{load_leagues, parse_leagues, LeagueConfig, LeaguesFile};
pub use refund::{
    calculate_refund, calculate_refund_at, quote_for_schedule, tier_table, OutcomeKind,
    RefundInputError, RefundMode, RefundOutcome, RefundRequest, TierRule,
};
pub use schedule::WeekSchedule;
