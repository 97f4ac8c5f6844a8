// Author-name classification.
//
// A name is "valid" when it matches one of the known templates. Templates
// are tried in a fixed order and the first hit wins, so a name like
// "C. S. Lewis" reports Abbreviation even though a looser template might
// also accept it. Trailing parentheticals ("(NIV)", "(Signet Classics)")
// are part of the templates and do not invalidate a name.

use regex::Regex;

/// The template a name matched, or Unknown if none did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// "C. S. Lewis", "J. K. Rowling"
    Abbreviation,
    /// "John F. Kennedy"
    InitialedName,
    /// "John Michael Gottman"
    FullName,
    /// Connector-word titles such as book titles used as attribution
    TitledName,
    /// "1 Kings 1:12-14 (NIV)"
    ScriptureReference,
    Unknown,
}

impl Template {
    pub fn label(self) -> &'static str {
        match self {
            Template::Abbreviation => "abbreviation",
            Template::InitialedName => "name with middle initial",
            Template::FullName => "full name",
            Template::TitledName => "title",
            Template::ScriptureReference => "scripture reference",
            Template::Unknown => "unknown",
        }
    }
}

pub struct NameClassifier {
    templates: Vec<(Template, Regex)>,
}

impl NameClassifier {
    pub fn new() -> Self {
        let compile = |p: &str| Regex::new(p).expect("hardcoded pattern");
        NameClassifier {
            templates: vec![
                (
                    Template::Abbreviation,
                    compile(r"^([A-Z]\. )+[A-Z][a-z]+(\s*\([^)]+\))?$"),
                ),
                (
                    Template::InitialedName,
                    compile(r"^[A-Z][a-z]+\s+[A-Z]\.\s+[A-Z][a-z]+(\s*\([^)]+\))?$"),
                ),
                (
                    Template::FullName,
                    compile(r"^[A-Z][a-z]+(\s+[A-Z][a-z]+)+(\s*\([^)]+\))?$"),
                ),
                (
                    Template::TitledName,
                    compile(r"^[A-Z][a-z]+(\s+(And|The|A|An|Or|In|Of|With|By)[a-z]+)*(\s*\([^)]+\))?$"),
                ),
                (
                    Template::ScriptureReference,
                    compile(r"^\d+\s+[A-Z][a-z]+\s+\d+[:\d-]*(\s*\([A-Z]+\))?$"),
                ),
            ],
        }
    }

    /// First matching template, in declaration order.
    pub fn classify(&self, name: &str) -> Template {
        for (template, regex) in &self.templates {
            if regex.is_match(name) {
                return *template;
            }
        }
        Template::Unknown
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.classify(name) != Template::Unknown
    }
}

impl Default for NameClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviation_names() {
        let c = NameClassifier::new();
        assert_eq!(c.classify("C. S. Lewis"), Template::Abbreviation);
        assert_eq!(c.classify("J. Tolkien"), Template::Abbreviation);
    }

    #[test]
    fn test_initialed_name() {
        let c = NameClassifier::new();
        assert_eq!(c.classify("John F. Kennedy"), Template::InitialedName);
    }

    #[test]
    fn test_full_name() {
        let c = NameClassifier::new();
        assert_eq!(c.classify("John Michael Gottman"), Template::FullName);
        assert_eq!(c.classify("Marie Curie"), Template::FullName);
    }

    #[test]
    fn test_scripture_reference() {
        let c = NameClassifier::new();
        assert_eq!(
            c.classify("1 Kings 1:12-14 (NIV)"),
            Template::ScriptureReference
        );
        assert_eq!(c.classify("2 Timothy 1:7"), Template::ScriptureReference);
    }

    #[test]
    fn test_trailing_parenthetical_is_allowed() {
        let c = NameClassifier::new();
        assert!(c.is_valid("Jane Austen (attributed)"));
    }

    #[test]
    fn test_garbage_is_unknown() {
        let c = NameClassifier::new();
        assert_eq!(c.classify("random$$$garbage"), Template::Unknown);
        assert_eq!(c.classify(""), Template::Unknown);
        assert_eq!(c.classify("lowercase name"), Template::Unknown);
        assert!(!c.is_valid("ALLCAPS"));
    }

    #[test]
    fn test_first_match_wins() {
        // Abbreviation is tried before the looser templates.
        let c = NameClassifier::new();
        assert_eq!(c.classify("A. B. Carter"), Template::Abbreviation);
    }
}
