//! Line-oriented page scraper.
//!
//! The game board page is scanned one trimmed line at a time and every
//! [`PageField`] pattern is tested against every line. Matches accumulate
//! per field in encounter order. Nothing is validated here: a field that
//! never matches simply ends up empty.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Fields extracted from a game page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageField {
    /// Game name from the `<title>` tag.
    Title,
    /// In-game date label.
    Date,
    /// Phase label.
    Phase,
    /// Defeated countries.
    Defeated,
    /// Countries in a draw.
    Drawn,
    /// Countries that have submitted orders.
    Ready,
    /// Countries that still need to submit orders.
    NotReady,
    /// Winning country.
    Won,
    /// Unix timestamp of the phase deadline.
    Deadline,
    /// Marker present before the game starts.
    Pregame,
    /// Relative link to the large map image.
    MapLink,
}

impl PageField {
    /// Every field, in scan order.
    pub const ALL: [Self; 11] = [
        Self::Title,
        Self::Date,
        Self::Phase,
        Self::Defeated,
        Self::Drawn,
        Self::Ready,
        Self::NotReady,
        Self::Won,
        Self::Deadline,
        Self::Pregame,
        Self::MapLink,
    ];

    /// Pattern whose first capture group is the field value.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Title => r"^.*<title>(.*?) - webDiplomacy<.*",
            Self::Date => r#"^.*gameDate">(.*?)<.*"#,
            Self::Phase => r#"^.*gamePhase">(.*?)<.*"#,
            Self::Defeated => r#"^.*memberCountryName.*memberStatusDefeated">(.*?)<.*"#,
            Self::Drawn => r#"^.*memberCountryName.*memberStatusDrawn">(.*?)<.*"#,
            Self::Ready => r#"^.*memberCountryName.*tick.*rStatusPlaying">(.*?)<.*"#,
            Self::NotReady => r#"^.*memberCountryName.*alert.*StatusPlaying">(.*?)<.*"#,
            Self::Won => r#"^.*memberCountryName.*memberStatusWon">(.*?)<.*"#,
            Self::Deadline => r#"^.*gameTimeRemaining.*unixtime="([0-9]+)".*"#,
            Self::Pregame => r#"^.*(memberPreGameList)">.*"#,
            Self::MapLink => r#"^.*<a.*LargeMapLink.*href="(.*?)".*"#,
        }
    }
}

/// Raw per-field matches of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedPage {
    /// [`PageField::Title`] matches.
    pub title: Vec<String>,
    /// [`PageField::Date`] matches.
    pub date: Vec<String>,
    /// [`PageField::Phase`] matches.
    pub phase: Vec<String>,
    /// [`PageField::Defeated`] matches.
    pub defeated: Vec<String>,
    /// [`PageField::Drawn`] matches.
    pub drawn: Vec<String>,
    /// [`PageField::Ready`] matches.
    pub ready: Vec<String>,
    /// [`PageField::NotReady`] matches.
    pub not_ready: Vec<String>,
    /// [`PageField::Won`] matches.
    pub won: Vec<String>,
    /// [`PageField::Deadline`] matches.
    pub deadline: Vec<String>,
    /// [`PageField::Pregame`] matches.
    pub pregame: Vec<String>,
    /// [`PageField::MapLink`] matches.
    pub map_link: Vec<String>,
}

impl ParsedPage {
    /// Matches collected for `field`.
    #[must_use]
    pub fn get(&self, field: PageField) -> &[String] {
        match field {
            PageField::Title => &self.title,
            PageField::Date => &self.date,
            PageField::Phase => &self.phase,
            PageField::Defeated => &self.defeated,
            PageField::Drawn => &self.drawn,
            PageField::Ready => &self.ready,
            PageField::NotReady => &self.not_ready,
            PageField::Won => &self.won,
            PageField::Deadline => &self.deadline,
            PageField::Pregame => &self.pregame,
            PageField::MapLink => &self.map_link,
        }
    }

    fn push(&mut self, field: PageField, value: String) {
        let slot = match field {
            PageField::Title => &mut self.title,
            PageField::Date => &mut self.date,
            PageField::Phase => &mut self.phase,
            PageField::Defeated => &mut self.defeated,
            PageField::Drawn => &mut self.drawn,
            PageField::Ready => &mut self.ready,
            PageField::NotReady => &mut self.not_ready,
            PageField::Won => &mut self.won,
            PageField::Deadline => &mut self.deadline,
            PageField::Pregame => &mut self.pregame,
            PageField::MapLink => &mut self.map_link,
        };
        slot.push(value);
    }
}

/// Turns raw page text into per-field matches.
pub trait PageParser: Send + Sync {
    /// Parses `content`. Must be deterministic for a given input.
    fn parse(&self, content: &str) -> ParsedPage;
}

static PATTERNS: LazyLock<Vec<(PageField, Regex)>> = LazyLock::new(|| {
    PageField::ALL
        .iter()
        .filter_map(|field| Regex::new(field.pattern()).ok().map(|re| (*field, re)))
        .collect()
});

/// Default [`PageParser`] for webDiplomacy board pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexPageParser;

impl PageParser for RegexPageParser {
    fn parse(&self, content: &str) -> ParsedPage {
        let mut page = ParsedPage::default();
        for line in content.lines() {
            let line = line.trim();
            for (field, pattern) in PATTERNS.iter() {
                if let Some(value) = pattern.captures(line).and_then(|c| c.get(1)) {
                    page.push(*field, value.as_str().to_string());
                }
            }
        }
        tracing::debug!(?page, "parsed game page");
        page
    }
}
