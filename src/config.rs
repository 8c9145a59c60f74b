//! Bracket format and web server settings.

use crate::models::BracketError;
use serde::{Deserialize, Serialize};

/// Shape of a linear elimination bracket.
///
/// Every round is split into contests of `contest_width` competitors;
/// `advancing_per_contest` of them move on. The last round is a single contest.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EliminationFormat {
    pub contest_width: usize,
    pub advancing_per_contest: usize,
    pub required_competitors: usize,
}

impl Default for EliminationFormat {
    /// NCAA gymnastics: 32 teams, meets of 4, top 2 advance.
    fn default() -> Self {
        Self {
            contest_width: 4,
            advancing_per_contest: 2,
            required_competitors: 32,
        }
    }
}

impl EliminationFormat {
    /// Reject formats whose rounds do not reduce to exactly one final contest.
    pub fn validate(&self) -> Result<(), BracketError> {
        let width = self.contest_width;
        if width < 2 || width % 2 != 0 {
            return Err(BracketError::validation(format!(
                "Contest width must be an even number of at least 2 (got {width})."
            )));
        }
        if self.advancing_per_contest == 0 || self.advancing_per_contest >= width {
            return Err(BracketError::validation(format!(
                "Between 1 and {} competitors must advance per contest (got {}).",
                width - 1,
                self.advancing_per_contest
            )));
        }
        let mut competitors = self.required_competitors;
        while competitors != width {
            if competitors < width || competitors % width != 0 {
                return Err(BracketError::validation(format!(
                    "{} competitors cannot be reduced to a single contest of {width}.",
                    self.required_competitors
                )));
            }
            competitors = competitors / width * self.advancing_per_contest;
        }
        Ok(())
    }

    /// Two-opponent matches needed to play one contest.
    pub fn matches_per_contest(&self) -> usize {
        self.contest_width / 2
    }

    /// Competitors entering each round, first round first. Assumes a validated format.
    pub fn round_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.required_competitors];
        let mut competitors = self.required_competitors;
        while competitors > self.contest_width && competitors % self.contest_width == 0 {
            competitors = competitors / self.contest_width * self.advancing_per_contest;
            sizes.push(competitors);
        }
        sizes
    }

    pub fn round_count(&self) -> usize {
        self.round_sizes().len()
    }

    /// Total match rows of a full bracket.
    pub fn total_matches(&self) -> usize {
        self.round_sizes()
            .iter()
            .map(|n| n / self.contest_width * self.matches_per_contest())
            .sum()
    }

    pub fn ensure_competitor_count(&self, count: usize) -> Result<(), BracketError> {
        if count != self.required_competitors {
            return Err(BracketError::validation(format!(
                "Elimination requires exactly {} competitors (got {count}).",
                self.required_competitors
            )));
        }
        Ok(())
    }
}

/// Where the web binary listens. Read from `HOST` / `PORT`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Defaults, overridden by `HOST` (e.g. 0.0.0.0) and `PORT` (e.g. 8080). An unparsable port is ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }
}
