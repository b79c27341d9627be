use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::{parse_off_dates, parse_season_date, DateParseError};
use crate::refund::RefundRequest;
use crate::schedule::WeekSchedule;
use crate::ConfigError;

/// One league season as registered in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// `M/D/YYYY` or `M/D/YY`.
    pub season_start_date: String,
    /// Comma-separated off-dates, same format as [`RefundRequest::off_dates`].
    #[serde(default)]
    pub off_dates: String,
    /// Registration price, used when a quote does not name its own cost.
    pub price: Option<Decimal>,
    pub notes: Option<String>,
}

impl LeagueConfig {
    /// Generate a URL-safe slug from the league name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// The season's tier boundaries with off-dates applied.
    ///
    /// # Errors
    ///
    /// Returns [`DateParseError`] if the season start date is malformed.
    pub fn schedule(&self) -> Result<WeekSchedule, DateParseError> {
        let season_start = parse_season_date(&self.season_start_date)?;
        let off_dates = parse_off_dates(&self.off_dates, season_start);
        Ok(WeekSchedule::with_off_dates(season_start, &off_dates))
    }

    /// Build a calculation request for this league. `original_cost` falls
    /// back to the league's listed price.
    #[must_use]
    pub fn refund_request(
        &self,
        mode: &str,
        original_cost: Option<Decimal>,
        submitted_at: Option<DateTime<Utc>>,
    ) -> RefundRequest {
        RefundRequest {
            season_start_date: Some(self.season_start_date.clone()),
            off_dates: self.off_dates.clone(),
            original_cost: original_cost.or(self.price),
            mode: Some(mode.to_string()),
            submitted_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaguesFile {
    pub leagues: Vec<LeagueConfig>,
}

impl LeaguesFile {
    /// Look up a league by slug.
    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&LeagueConfig> {
        self.leagues.iter().find(|l| l.slug() == slug)
    }
}

/// Load and validate the league catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_leagues(path: &Path) -> Result<LeaguesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LeaguesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let leagues = parse_leagues(&content)?;
    tracing::info!(
        path = %path.display(),
        count = leagues.leagues.len(),
        "loaded league catalog"
    );
    Ok(leagues)
}

/// Parse and validate a league catalog from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_leagues(content: &str) -> Result<LeaguesFile, ConfigError> {
    let leagues_file: LeaguesFile = serde_yaml::from_str(content)?;
    validate_leagues(&leagues_file)?;
    Ok(leagues_file)
}

fn validate_leagues(leagues_file: &LeaguesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for league in &leagues_file.leagues {
        if league.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "league name must be non-empty".to_string(),
            ));
        }

        if let Err(e) = parse_season_date(&league.season_start_date) {
            return Err(ConfigError::Validation(format!(
                "league '{}' has an invalid season_start_date: {e}",
                league.name
            )));
        }

        if league.price.is_some_and(|p| p.is_sign_negative() && !p.is_zero()) {
            return Err(ConfigError::Validation(format!(
                "league '{}' has a negative price",
                league.name
            )));
        }

        let lower_name = league.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate league name: '{}'",
                league.name
            )));
        }

        let slug = league.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate league slug: '{}' (from league '{}')",
                slug, league.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
leagues:
  - name: "Monday Kickball"
    season_start_date: "10/20/2025"
    off_dates: "11/24/2025"
    price: "120.00"
  - name: "Tuesday Dodgeball (Co-ed)"
    season_start_date: "1/6/26"
"#;

    fn league(name: &str) -> LeagueConfig {
        LeagueConfig {
            name: name.to_string(),
            season_start_date: "10/20/2025".to_string(),
            off_dates: String::new(),
            price: None,
            notes: None,
        }
    }

    #[test]
    fn slug_simple_name() {
        assert_eq!(league("Monday Kickball").slug(), "monday-kickball");
    }

    #[test]
    fn slug_strips_punctuation() {
        assert_eq!(
            league("Tuesday Dodgeball (Co-ed)").slug(),
            "tuesday-dodgeball-co-ed"
        );
        assert_eq!(league("  Sunday  Bowling ").slug(), "sunday-bowling");
    }

    #[test]
    fn parse_leagues_reads_catalog() {
        let file = parse_leagues(CATALOG).unwrap();
        assert_eq!(file.leagues.len(), 2);
        let kickball = file.find("monday-kickball").expect("kickball listed");
        assert_eq!(kickball.price, Some(Decimal::new(12000, 2)));
        assert_eq!(kickball.off_dates, "11/24/2025");
        let dodgeball = file.find("tuesday-dodgeball-co-ed").expect("dodgeball listed");
        assert!(dodgeball.off_dates.is_empty());
        assert!(dodgeball.price.is_none());
    }

    #[test]
    fn find_returns_none_for_unknown_slug() {
        let file = parse_leagues(CATALOG).unwrap();
        assert!(file.find("wednesday-pickleball").is_none());
    }

    #[test]
    fn schedule_applies_off_dates() {
        let mut kickball = league("Monday Kickball");
        kickball.off_dates = "11/10/2025".to_string();
        let schedule = kickball.schedule().unwrap();
        assert_eq!(
            schedule.final_week_start().date_naive().to_string(),
            "2025-11-24"
        );
    }

    #[test]
    fn refund_request_falls_back_to_listed_price() {
        let mut kickball = league("Monday Kickball");
        kickball.price = Some(Decimal::from(95));
        let req = kickball.refund_request("credit", None, None);
        assert_eq!(req.original_cost, Some(Decimal::from(95)));
        assert_eq!(req.mode.as_deref(), Some("credit"));

        let overridden = kickball.refund_request("refund", Some(Decimal::from(40)), None);
        assert_eq!(overridden.original_cost, Some(Decimal::from(40)));
    }

    #[test]
    fn validation_rejects_duplicate_slugs() {
        let yaml = r#"
leagues:
  - name: "Monday Kickball"
    season_start_date: "10/20/2025"
  - name: "Monday  Kickball!"
    season_start_date: "10/20/2025"
"#;
        let err = parse_leagues(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate league slug")));
    }

    #[test]
    fn validation_rejects_bad_season_start() {
        let yaml = r#"
leagues:
  - name: "Monday Kickball"
    season_start_date: "sometime in October"
"#;
        let err = parse_leagues(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("season_start_date")));
    }

    #[test]
    fn validation_rejects_negative_price() {
        let yaml = r#"
leagues:
  - name: "Monday Kickball"
    season_start_date: "10/20/2025"
    price: "-1"
"#;
        assert!(matches!(
            parse_leagues(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        assert!(matches!(
            parse_leagues("leagues: [unclosed"),
            Err(ConfigError::LeaguesFileParse(_))
        ));
    }

    #[test]
    fn load_leagues_reports_missing_file() {
        let err = load_leagues(Path::new("/nonexistent/leagues.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LeaguesFileIo { .. }));
    }
}
