// Format suggestions for malformed author names.
//
// suggest() is a pure function of the input name and is idempotent: feeding
// a suggestion back through produces the same string. The caller decides
// whether to apply it.

use regex::Regex;

pub struct FormatSuggester {
    extract: Regex,
    scripture: Regex,
    connector: Regex,
    abbrev: Regex,
    leading_initial: Regex,
    trailing_paren: Regex,
}

/// Words kept lowercase inside title-cased names, unless they lead.
const LOWERCASE_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn is_all_upper(name: &str) -> bool {
    let mut has_cased = false;
    for c in name.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

impl FormatSuggester {
    pub fn new() -> Self {
        let compile = |p: &str| Regex::new(p).expect("hardcoded pattern");
        FormatSuggester {
            extract: compile(r#"(\w+)\s+"{2,}(.+?)"{2,}\s+(\w+)"#),
            scripture: compile(r"^\d+\s+[A-Z]"),
            connector: compile(r"(?i)\b(the|a|an|and|or)\b"),
            abbrev: compile(r"([A-Z])\.([A-Z])\."),
            leading_initial: compile(r"^[A-Z]\.\s"),
            trailing_paren: compile(r"^(.*?)(\(.+\))$"),
        }
    }

    /// Best-effort cleanup of a name. Falls through three heuristics:
    /// embedded quotation marks, scripture references (left untouched),
    /// title-like strings, and abbreviation spacing for everything else.
    pub fn suggest(&self, name: &str) -> String {
        let name = if name.contains(r#"""""#) {
            self.clean_quotation_marks(name)
        } else {
            name.to_string()
        };

        if self.scripture.is_match(&name) {
            return name;
        }

        if self.looks_like_title(&name) && !self.leading_initial.is_match(&name) {
            return self.title_case(&name);
        }

        self.fix_abbreviations(&name)
    }

    /// Pull content out of runs of doubled quotes:
    /// `Lewis """The Four Loves""" Clive` -> `Lewis Clive (The Four Loves)`.
    /// Without that shape, all quote characters are dropped.
    fn clean_quotation_marks(&self, name: &str) -> String {
        if let Some(caps) = self.extract.captures(name) {
            let before = &caps[1];
            let content = caps[2].trim();
            let after = &caps[3];
            return format!("{before} {after} ({content})");
        }
        name.replace('"', "")
    }

    fn looks_like_title(&self, name: &str) -> bool {
        is_all_upper(name)
            || self.connector.is_match(name)
            || name.contains(": ")
            || (name.matches(' ').count() > 2
                && name.chars().filter(|c| c.is_uppercase()).count() > 2)
    }

    /// Title-case with connector words lowered, except in first position.
    /// A trailing parenthetical is detached first and reattached verbatim.
    fn title_case(&self, name: &str) -> String {
        let (body, paren) = match self.trailing_paren.captures(name) {
            Some(caps) => (
                caps.get(1).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
                Some(caps[2].to_string()),
            ),
            None => (name.to_string(), None),
        };

        let words: Vec<String> = body
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| {
                let lower = word.to_lowercase();
                if i > 0 && LOWERCASE_WORDS.contains(&lower.as_str()) {
                    lower
                } else {
                    capitalize(word)
                }
            })
            .collect();

        let mut result = words.join(" ");
        if let Some(paren) = paren {
            result.push(' ');
            result.push_str(&paren);
        }
        result
    }

    /// `C.S. Lewis` -> `C. S. Lewis`.
    fn fix_abbreviations(&self, name: &str) -> String {
        // Replacements can expose new adjacent pairs (J.R.R. fixes one pair
        // per pass), so repeat until stable.
        let mut current = name.trim().to_string();
        loop {
            let next = self.abbrev.replace_all(&current, "$1. $2.").trim().to_string();
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

impl Default for FormatSuggester {
    fn default() -> Self {
        Self::new()
    }
}
