//! Robots.txt directive parser
//!
//! Converts raw robots.txt text into a [`RobotsDocument`]. Groups are
//! delimited by blank lines: every `User-agent` line collected before the
//! terminator receives its own copy of the directives that followed.

use crate::robots::rules::{RobotsDocument, UserAgentRuleSet};
use crate::RobotsError;
use std::collections::HashMap;

/// Directive keywords, matched case-insensitively as line prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    UserAgent,
    Disallow,
    Allow,
    CrawlDelay,
    ContentSignal,
    Sitemap,
}

impl Directive {
    const KEYWORDS: [(&'static str, Directive); 6] = [
        ("user-agent", Directive::UserAgent),
        ("disallow", Directive::Disallow),
        ("allow", Directive::Allow),
        ("crawl-delay", Directive::CrawlDelay),
        ("content-signal", Directive::ContentSignal),
        ("sitemap", Directive::Sitemap),
    ];

    fn recognize(line: &str) -> Option<Self> {
        let lowered = line.to_ascii_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.starts_with(keyword))
            .map(|(_, directive)| *directive)
    }
}

/// Accumulates the group currently being read
#[derive(Default)]
struct PendingGroup {
    names: Vec<String>,
    rules: UserAgentRuleSet,
}

impl PendingGroup {
    /// Binds a copy of the rules to every collected name and resets the group
    fn flush_into(&mut self, agents: &mut HashMap<String, UserAgentRuleSet>) {
        let group = std::mem::take(self);
        for name in group.names {
            agents.insert(name, group.rules.clone());
        }
    }
}

/// Parses robots.txt text into a [`RobotsDocument`]
///
/// # Grouping
///
/// - `#` lines are comments and never end a group
/// - A blank line ends the group only if a `User-agent` line was seen since
///   the previous terminator; otherwise it is ignored
/// - A group still pending at end of input is flushed as if terminated
///
/// # Errors
///
/// Fails on a `Crawl-delay` value that is not a finite number and on a
/// `Content-Signal` entry without a `name=value` separator. Unknown
/// directives and lines without `:` are logged and skipped.
///
/// # Examples
///
/// ```
/// use handmade_crawler::robots::parse_robots;
///
/// let doc = parse_robots("User-agent: *\nDisallow: /a\nAllow: /b\nCrawl-delay: 2.1\n").unwrap();
/// let rules = doc.wildcard_rules().unwrap();
/// assert_eq!(rules.disallow, vec!["/a"]);
/// assert_eq!(rules.allow, vec!["/b"]);
/// assert_eq!(rules.crawl_delay_seconds(), 3);
/// ```
pub fn parse_robots(text: &str) -> Result<RobotsDocument, RobotsError> {
    let mut agents: HashMap<String, UserAgentRuleSet> = HashMap::new();
    let mut sitemap: Option<String> = None;
    let mut pending = PendingGroup::default();

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();

        if line.starts_with('#') {
            continue;
        }

        if line.is_empty() {
            if !pending.names.is_empty() {
                pending.flush_into(&mut agents);
            }
            continue;
        }

        if !line.contains(':') {
            tracing::debug!("robots.txt line {}: unrecognized line '{}'", line_number, line);
            continue;
        }

        let directive = match Directive::recognize(line) {
            Some(directive) => directive,
            None => {
                tracing::debug!(
                    "robots.txt line {}: unrecognized directive '{}'",
                    line_number,
                    line
                );
                continue;
            }
        };

        let value = extract_value(line);

        match directive {
            Directive::UserAgent => pending.names.push(value.to_string()),
            Directive::Disallow => pending.rules.disallow.push(value.to_string()),
            Directive::Allow => pending.rules.allow.push(value.to_string()),
            Directive::CrawlDelay => {
                pending.rules.crawl_delay = Some(parse_crawl_delay(value, line_number)?);
            }
            Directive::ContentSignal => {
                for (name, enabled) in parse_content_signals(value, line_number)? {
                    pending.rules.content_signals.insert(name, enabled);
                }
            }
            Directive::Sitemap => sitemap = Some(value.to_string()),
        }
    }

    if !pending.names.is_empty() {
        pending.flush_into(&mut agents);
    }

    Ok(RobotsDocument::new(agents, sitemap))
}

/// Everything after the first `:`, trimmed
fn extract_value(line: &str) -> &str {
    line.split_once(':')
        .map(|(_, value)| value.trim())
        .unwrap_or_default()
}

/// Parses a possibly fractional delay and rounds it up to whole seconds
fn parse_crawl_delay(value: &str, line: usize) -> Result<u64, RobotsError> {
    let invalid = || RobotsError::InvalidCrawlDelay {
        line,
        value: value.to_string(),
    };

    let seconds: f64 = value.parse().map_err(|_| invalid())?;
    if !seconds.is_finite() {
        return Err(invalid());
    }

    Ok(seconds.ceil().max(0.0) as u64)
}

/// Splits `a=yes, b=no` into `(name, value == "yes")` pairs
fn parse_content_signals(value: &str, line: usize) -> Result<Vec<(String, bool)>, RobotsError> {
    value
        .split(',')
        .map(str::trim)
        .map(|entry| -> Result<(String, bool), RobotsError> {
            let (name, setting) =
                entry
                    .split_once('=')
                    .ok_or_else(|| RobotsError::MalformedContentSignal {
                        line,
                        entry: entry.to_string(),
                    })?;
            Ok((name.trim().to_string(), setting.trim() == "yes"))
        })
        .collect()
}
