// Heuristic detection of suspicious author names.

use regex::Regex;

use crate::sanitize::classify::NameClassifier;
use crate::sanitize::lists::{AllowList, DenyList};

pub struct GarbageDetector {
    classifier: NameClassifier,
    glued_abbrev: Regex,
    spaced_abbrev: Regex,
    inner_capital: Regex,
    leading_digits: Regex,
    scripture_shape: Regex,
}

impl GarbageDetector {
    pub fn new() -> Self {
        let compile = |p: &str| Regex::new(p).expect("hardcoded pattern");
        GarbageDetector {
            classifier: NameClassifier::new(),
            glued_abbrev: compile(r"[A-Z]\.[A-Z]\."),
            spaced_abbrev: compile(r"[A-Z]\. [A-Z]\."),
            inner_capital: compile(r"[A-Z][a-z]*[A-Z]"),
            leading_digits: compile(r"^\d+"),
            scripture_shape: compile(r"^\d+\s+[A-Za-z]+"),
        }
    }

    /// Run every heuristic against a name. An empty result means the name
    /// looks fine. An allow-listed name short-circuits to empty before any
    /// heuristic runs, including the deny-list.
    pub fn assess(&self, name: &str, allow: &AllowList, deny: &DenyList) -> Vec<String> {
        if allow.contains(name) {
            return Vec::new();
        }

        let mut issues = Vec::new();

        if let Some(reason) = deny.matches(name) {
            issues.push(format!("deny-list match ({reason})"));
        }

        let quote_count = name.matches('"').count();
        if quote_count > 2 {
            issues.push(format!("excessive quotes ({quote_count} found)"));
        }

        // C.S.Lewis without any properly spaced C. S. pair.
        if self.glued_abbrev.is_match(name) && !self.spaced_abbrev.is_match(name) {
            issues.push("improper abbreviation spacing".to_string());
        }

        // A capital inside a word, unless a parenthetical explains it.
        if self.inner_capital.is_match(name) && !name.contains('(') {
            issues.push("unusual capitalization".to_string());
        }

        if self.leading_digits.is_match(name) && !self.scripture_shape.is_match(name) {
            issues.push("possible malformed scripture reference".to_string());
        }

        let period_count = name.matches('.').count();
        if period_count > 4 {
            issues.push("excessive periods".to_string());
        }

        if !self.classifier.is_valid(name) {
            issues.push("doesn't match standard patterns".to_string());
        }

        issues
    }

    pub fn classifier(&self) -> &NameClassifier {
        &self.classifier
    }
}

impl Default for GarbageDetector {
    fn default() -> Self {
        Self::new()
    }
}
