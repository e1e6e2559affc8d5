//! Robots.txt data model
//!
//! A [`RobotsDocument`] is built once per hostname per crawl session and never
//! mutated afterwards. Every user-agent bound to a group owns its own copy of
//! the group's [`UserAgentRuleSet`].

use std::collections::{BTreeMap, HashMap};

/// The user-agent token that applies to every crawler
pub const WILDCARD_AGENT: &str = "*";

/// Rules that apply to one user-agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentRuleSet {
    /// Allowed path prefixes, in file order
    pub allow: Vec<String>,

    /// Disallowed path prefixes, in file order
    pub disallow: Vec<String>,

    /// Crawl delay in whole seconds (None when the group did not set one)
    pub crawl_delay: Option<u64>,

    /// Content-signal preferences; a missing key means unspecified
    pub content_signals: BTreeMap<String, bool>,
}

impl UserAgentRuleSet {
    /// Returns the delay to wait before each request, 0 when unspecified
    pub fn crawl_delay_seconds(&self) -> u64 {
        self.crawl_delay.unwrap_or(0)
    }

    /// Looks up a content signal by name
    ///
    /// Returns `None` when the signal was never declared, which is distinct
    /// from an explicit `false`.
    pub fn content_signal(&self, name: &str) -> Option<bool> {
        self.content_signals.get(name).copied()
    }

    /// Returns the first disallow prefix contained in `url`, in file order
    ///
    /// Matching is a plain substring test against the full URL string and the
    /// first listed prefix wins; there is no longest-match precedence. Empty
    /// prefixes (`Disallow:` with no value) disallow nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use handmade_crawler::robots::UserAgentRuleSet;
    ///
    /// let rules = UserAgentRuleSet {
    ///     disallow: vec!["/private".to_string(), "/private/deep".to_string()],
    ///     ..Default::default()
    /// };
    /// assert_eq!(
    ///     rules.first_disallow_match("https://a.test/private/deep/page"),
    ///     Some("/private")
    /// );
    /// assert_eq!(rules.first_disallow_match("https://a.test/public"), None);
    /// ```
    pub fn first_disallow_match(&self, url: &str) -> Option<&str> {
        self.disallow
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .find(|prefix| url.contains(prefix.as_str()))
            .map(String::as_str)
    }
}

/// Parsed robots.txt for one hostname
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsDocument {
    rules_by_agent: HashMap<String, UserAgentRuleSet>,
    sitemap: Option<String>,
}

impl RobotsDocument {
    pub(crate) fn new(
        rules_by_agent: HashMap<String, UserAgentRuleSet>,
        sitemap: Option<String>,
    ) -> Self {
        Self {
            rules_by_agent,
            sitemap,
        }
    }

    /// Synthesizes the document used when a host has no reachable robots.txt
    ///
    /// The wildcard group carries the fallback courtesy delay and declares
    /// `search=yes`; nothing is disallowed.
    ///
    /// # Arguments
    ///
    /// * `fallback_delay` - Crawl delay in seconds to apply to the host
    pub fn permissive(fallback_delay: u64) -> Self {
        let mut content_signals = BTreeMap::new();
        content_signals.insert("search".to_string(), true);

        let mut rules_by_agent = HashMap::new();
        rules_by_agent.insert(
            WILDCARD_AGENT.to_string(),
            UserAgentRuleSet {
                crawl_delay: Some(fallback_delay),
                content_signals,
                ..Default::default()
            },
        );

        Self {
            rules_by_agent,
            sitemap: None,
        }
    }

    /// Returns the rule set bound to the `*` user-agent, if any
    pub fn wildcard_rules(&self) -> Option<&UserAgentRuleSet> {
        self.rules_by_agent.get(WILDCARD_AGENT)
    }

    /// Returns the rules for an exact user-agent token, falling back to `*`
    ///
    /// Tokens are matched case-sensitively, exactly as written in the file.
    pub fn rules_for(&self, agent: &str) -> Option<&UserAgentRuleSet> {
        self.rules_by_agent
            .get(agent)
            .or_else(|| self.wildcard_rules())
    }

    /// Returns the user-agent tokens that have a rule set, sorted
    pub fn agents(&self) -> Vec<&str> {
        let mut agents: Vec<&str> = self.rules_by_agent.keys().map(String::as_str).collect();
        agents.sort_unstable();
        agents
    }

    /// Returns the sitemap URL (the last `Sitemap:` line in the file)
    pub fn sitemap(&self) -> Option<&str> {
        self.sitemap.as_deref()
    }

    /// Consumes the document, yielding every agent's independent rule set
    pub fn into_agents(self) -> HashMap<String, UserAgentRuleSet> {
        self.rules_by_agent
    }
}
