// Interactive review of flagged author names.
//
// The session walks the needs_review queue and asks for a decision per
// author. "Keep as is" and "skip" leave the flag set so the author shows
// up again next session; rename, accept and manual edit clear it. All
// input and output go through generic streams so the flows run under test
// with scripted input.

use std::io::{self, BufRead, Write};

use crate::db::Store;
use crate::entities::Author;
use crate::error::{Result, StoreError};
use crate::sanitize::detect::GarbageDetector;
use crate::sanitize::ledger::{ChangeKind, ChangeLedger};
use crate::sanitize::lists::{AllowList, DenyList};
use crate::sanitize::suggest::FormatSuggester;

const RULE: &str = "================================================================================";

pub struct ReviewSession<'s, R, W> {
    store: &'s Store,
    detector: GarbageDetector,
    suggester: FormatSuggester,
    allow: AllowList,
    deny: DenyList,
    ledger: ChangeLedger,
    changes_made: Vec<String>,
    skipped: Vec<String>,
    input: R,
    output: W,
}

impl<'s, R: BufRead, W: Write> ReviewSession<'s, R, W> {
    pub fn new(
        store: &'s Store,
        allow: AllowList,
        deny: DenyList,
        ledger: ChangeLedger,
        input: R,
        output: W,
    ) -> Self {
        ReviewSession {
            store,
            detector: GarbageDetector::new(),
            suggester: FormatSuggester::new(),
            allow,
            deny,
            ledger,
            changes_made: Vec::new(),
            skipped: Vec::new(),
            input,
            output,
        }
    }

    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input stream closed",
            )));
        }
        Ok(line.trim().to_string())
    }

    // ------------------------------------------------------------------
    // Top-level menu
    // ------------------------------------------------------------------

    pub fn run_menu(&mut self) -> Result<()> {
        writeln!(self.output, "Author Name Sanitizer")?;
        writeln!(self.output, "{RULE}")?;

        loop {
            writeln!(self.output, "\nModes:")?;
            writeln!(self.output, "  [1] Interactive mode (review each author)")?;
            writeln!(self.output, "  [2] Batch mode (auto-fix obvious issues)")?;
            writeln!(self.output, "  [3] View recent changes")?;
            writeln!(self.output, "  [4] Manage allow-list")?;
            writeln!(self.output, "  [5] Manage deny-list")?;
            writeln!(self.output, "  [6] Exit")?;

            let choice = self.prompt("\nChoose mode: ")?;
            match choice.as_str() {
                "1" => {
                    self.run_interactive()?;
                    break;
                }
                "2" => {
                    let confirm = self.prompt("Auto-fix obvious issues? (yes/no): ")?;
                    if confirm.eq_ignore_ascii_case("yes") {
                        self.run_batch(true)?;
                        break;
                    }
                    writeln!(self.output, "Cancelled")?;
                }
                "3" => self.show_recent_changes()?,
                "4" => self.manage_allow_list()?,
                "5" => self.manage_deny_list()?,
                "6" => {
                    writeln!(self.output, "Exiting...")?;
                    break;
                }
                _ => writeln!(self.output, "Invalid option")?,
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Interactive and batch runs
    // ------------------------------------------------------------------

    pub fn run_interactive(&mut self) -> Result<()> {
        let authors = self.store.authors().needs_review(None)?;
        if authors.is_empty() {
            writeln!(self.output, "✓ No authors need editing!")?;
            return Ok(());
        }

        writeln!(self.output, "\nFound {} authors needing editing", authors.len())?;
        writeln!(self.output, "{RULE}")?;

        let total = authors.len();
        for (i, author) in authors.iter().enumerate() {
            writeln!(self.output, "\n[{}/{total}]", i + 1)?;
            self.process_author(author)?;
        }

        self.print_summary()
    }

    /// Walk the queue without prompting per author. With `auto_fix` every
    /// suggestion is applied directly, merging when the suggested name
    /// already exists. Without it the queue is only listed.
    pub fn run_batch(&mut self, auto_fix: bool) -> Result<()> {
        let authors = self.store.authors().needs_review(None)?;
        if authors.is_empty() {
            writeln!(self.output, "✓ No authors need editing!")?;
            return Ok(());
        }

        writeln!(self.output, "\nProcessing {} authors...", authors.len())?;
        writeln!(self.output, "{RULE}")?;

        let total = authors.len();
        for (i, author) in authors.iter().enumerate() {
            let suggestion = self.suggester.suggest(&author.name);
            if suggestion == author.name {
                continue;
            }
            if auto_fix {
                writeln!(self.output, "[{}/{total}] Auto-fixing: {}", i + 1, author.name)?;
                match self.store.authors().get_by_name(&suggestion)? {
                    Some(existing) if existing.id != author.id => {
                        self.merge_authors(author, &existing)?;
                    }
                    _ => self.rename_author(author, &suggestion)?,
                }
            } else {
                writeln!(self.output, "[{}/{total}] Review needed: {}", i + 1, author.name)?;
            }
        }

        self.print_summary()
    }

    // ------------------------------------------------------------------
    // Per-author flow
    // ------------------------------------------------------------------

    pub fn process_author(&mut self, author: &Author) -> Result<()> {
        let issues = self.detector.assess(&author.name, &self.allow, &self.deny);
        if !issues.is_empty() {
            writeln!(self.output, "\n⚠ Issues detected: {}", issues.join(", "))?;
        }

        self.print_author(author)?;

        let suggestion = self.suggester.suggest(&author.name);
        if suggestion != author.name {
            writeln!(self.output, "\nSuggested format: {suggestion}")?;
        } else {
            writeln!(self.output, "\nNo format changes suggested.")?;
        }

        loop {
            writeln!(self.output, "\nOptions:")?;
            writeln!(self.output, "  [1] Keep as is")?;
            if suggestion != author.name {
                writeln!(self.output, "  [2] Accept suggestion")?;
            }
            writeln!(self.output, "  [3] Manual edit")?;
            writeln!(self.output, "  [4] Add to allow-list (skip)")?;
            writeln!(self.output, "  [5] Add to deny-list")?;
            writeln!(self.output, "  [6] Delete author and all quotes")?;
            writeln!(self.output, "  [7] Skip this author")?;

            let choice = self.prompt("\nChoose option: ")?;
            match choice.as_str() {
                "1" => {
                    self.skipped.push(author.name.clone());
                    writeln!(self.output, "✓ Keeping as is")?;
                    return Ok(());
                }
                "2" if suggestion != author.name => {
                    self.apply_change(author, &suggestion)?;
                    return Ok(());
                }
                "3" => {
                    let new_name = self.prompt("Enter correct author name: ")?;
                    if new_name.is_empty() {
                        writeln!(self.output, "Name cannot be empty")?;
                    } else {
                        self.apply_change(author, &new_name)?;
                        return Ok(());
                    }
                }
                "4" => {
                    self.allow
                        .add(&author.name, "User approved during sanitization")?;
                    writeln!(self.output, "✓ Added '{}' to allow-list", author.name)?;
                    self.skipped.push(author.name.clone());
                    return Ok(());
                }
                "5" => {
                    let _reason = self.prompt("Reason for deny-listing: ")?;
                    self.deny.add_exact(&author.name)?;
                    writeln!(self.output, "✓ Added '{}' to deny-list", author.name)?;

                    let delete = self.prompt("Delete this author and quotes? (yes/no): ")?;
                    if delete.eq_ignore_ascii_case("yes") {
                        self.store.authors().delete(author.id)?;
                        writeln!(self.output, "✓ Deleted")?;
                        self.changes_made.push(format!("DELETED: {}", author.name));
                    }
                    return Ok(());
                }
                "6" => {
                    let quote_count = self.store.authors().quote_count(author.id)?;
                    let confirm = self.prompt(&format!(
                        "Delete '{}' and its {quote_count} quotes? (yes/no): ",
                        author.name
                    ))?;
                    if confirm.eq_ignore_ascii_case("yes") {
                        self.store.authors().delete(author.id)?;
                        writeln!(self.output, "✓ Deleted")?;
                        self.changes_made.push(format!("DELETED: {}", author.name));
                        self.ledger
                            .append(ChangeKind::Deleted, author.id, &author.name, "", None)?;
                        return Ok(());
                    }
                    writeln!(self.output, "Cancelled")?;
                }
                "7" => {
                    self.skipped.push(author.name.clone());
                    writeln!(self.output, "✓ Skipped")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid option")?,
            }
        }
    }

    fn print_author(&mut self, author: &Author) -> Result<()> {
        writeln!(self.output, "\n{RULE}")?;
        writeln!(self.output, "ID: {}", author.id)?;
        writeln!(self.output, "Name: {}", author.name)?;

        let template = self.detector.classifier().classify(&author.name);
        if self.detector.classifier().is_valid(&author.name) {
            writeln!(self.output, "Status: ✓ Valid ({})", template.label())?;
        } else {
            writeln!(self.output, "Status: ✗ Invalid format")?;
        }

        if author.birth_year.is_some() || author.death_year.is_some() {
            let birth = author
                .birth_year
                .map_or("?".to_string(), |y| y.to_string());
            let death = author
                .death_year
                .map_or("?".to_string(), |y| y.to_string());
            writeln!(self.output, "Years: {birth}-{death}")?;
        }
        if let Some(profession) = &author.profession {
            writeln!(self.output, "Profession: {profession}")?;
        }
        if let Some(nationality) = &author.nationality {
            writeln!(self.output, "Nationality: {nationality}")?;
        }

        let quote_count = self.store.authors().quote_count(author.id)?;
        writeln!(self.output, "Quotes: {quote_count}")?;
        let sample = self.store.quotes().by_author_id(author.id, Some(1))?;
        if let Some(quote) = sample.first() {
            let head: String = quote.text.chars().take(70).collect();
            writeln!(self.output, "Sample quote: {head}...")?;
        }
        writeln!(self.output, "{RULE}")?;
        Ok(())
    }

    /// Apply a name change, routing through a merge when the target name
    /// already belongs to another author.
    fn apply_change(&mut self, author: &Author, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name == author.name {
            writeln!(self.output, "No change made")?;
            return Ok(());
        }

        if let Some(existing) = self.store.authors().get_by_name(new_name)? {
            if existing.id != author.id {
                let existing_quotes = self.store.authors().quote_count(existing.id)?;
                let own_quotes = self.store.authors().quote_count(author.id)?;
                writeln!(self.output, "\n⚠ Author '{new_name}' already exists!")?;
                writeln!(self.output, "  Existing author has {existing_quotes} quotes")?;
                writeln!(
                    self.output,
                    "  Current author '{}' has {own_quotes} quotes",
                    author.name
                )?;

                let merge = self.prompt("\nMerge these authors? (yes/no): ")?;
                if merge.eq_ignore_ascii_case("yes") {
                    self.merge_authors(author, &existing)?;
                } else {
                    writeln!(self.output, "Cancelled - no changes made")?;
                }
                return Ok(());
            }
        }

        self.rename_author(author, new_name)
    }

    fn rename_author(&mut self, author: &Author, new_name: &str) -> Result<()> {
        self.store.authors().rename(author.id, new_name)?;
        self.ledger
            .append(ChangeKind::Renamed, author.id, &author.name, new_name, None)?;
        writeln!(self.output, "✓ Changed: '{}' -> '{new_name}'", author.name)?;
        self.changes_made
            .push(format!("RENAMED: '{}' -> '{new_name}'", author.name));
        Ok(())
    }

    fn merge_authors(&mut self, from: &Author, to: &Author) -> Result<()> {
        let quote_count = self.store.authors().quote_count(from.id)?;
        writeln!(
            self.output,
            "\nMerging {quote_count} quotes from '{}' to '{}'...",
            from.name, to.name
        )?;
        self.store.authors().merge(from.id, to.id)?;
        self.ledger.append(
            ChangeKind::Merged,
            from.id,
            &from.name,
            &to.name,
            Some(&to.name),
        )?;
        self.changes_made
            .push(format!("MERGED: '{}' -> '{}'", from.name, to.name));
        writeln!(self.output, "✓ Merge complete!")?;
        Ok(())
    }

    /// Undo is recorded as an intent only. Reverting requires replaying the
    /// ledger against the database, which is not wired up yet.
    pub fn undo_last_change(&mut self) -> Result<()> {
        let recent = self.ledger.latest(1);
        let Some(change) = recent.first() else {
            writeln!(self.output, "No changes to undo")?;
            return Ok(());
        };
        writeln!(
            self.output,
            "\nUndoing: {:?} '{}' -> '{}'",
            change.kind, change.old_name, change.new_name
        )?;
        writeln!(self.output, "Note: Undo is not yet implemented in the database layer")?;
        writeln!(
            self.output,
            "You would need to manually revert this change or restore from backup"
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Menu helpers
    // ------------------------------------------------------------------

    fn show_recent_changes(&mut self) -> Result<()> {
        let recent: Vec<_> = self.ledger.latest(10).to_vec();
        writeln!(self.output, "\nRecent changes ({} shown):", recent.len())?;
        for change in recent {
            writeln!(
                self.output,
                "  {}: {:?} - {} -> {}",
                change.timestamp, change.kind, change.old_name, change.new_name
            )?;
        }
        Ok(())
    }

    fn manage_allow_list(&mut self) -> Result<()> {
        writeln!(self.output, "\nAllow-list Management:")?;
        writeln!(self.output, "  [1] View allow-list")?;
        writeln!(self.output, "  [2] Add to allow-list")?;
        writeln!(self.output, "  [3] Remove from allow-list")?;
        writeln!(self.output, "  [4] Back")?;
        let choice = self.prompt("Choose: ")?;

        match choice.as_str() {
            "1" => {
                if self.allow.is_empty() {
                    writeln!(self.output, "  Allow-list is empty")?;
                } else {
                    let names: Vec<String> = self.allow.names().cloned().collect();
                    for name in names.iter().take(20) {
                        writeln!(self.output, "  - {name}")?;
                    }
                    if names.len() > 20 {
                        writeln!(self.output, "  ... and {} more", names.len() - 20)?;
                    }
                }
            }
            "2" => {
                let name = self.prompt("Enter author name: ")?;
                let notes = self.prompt("Notes (optional): ")?;
                self.allow.add(&name, &notes)?;
                writeln!(self.output, "✓ Added '{name}' to allow-list")?;
            }
            "3" => {
                let name = self.prompt("Enter author name to remove: ")?;
                self.allow.remove(&name)?;
                writeln!(self.output, "✓ Removed '{name}' from allow-list")?;
            }
            _ => {}
        }
        Ok(())
    }

    fn manage_deny_list(&mut self) -> Result<()> {
        writeln!(self.output, "\nDeny-list Management:")?;
        writeln!(self.output, "  [1] View deny-list")?;
        writeln!(self.output, "  [2] Add exact name")?;
        writeln!(self.output, "  [3] Add pattern")?;
        writeln!(self.output, "  [4] Back")?;
        let choice = self.prompt("Choose: ")?;

        match choice.as_str() {
            "1" => {
                let names: Vec<String> = self.deny.exact_names().cloned().collect();
                if !names.is_empty() {
                    writeln!(self.output, "Exact names:")?;
                    for name in names.iter().take(10) {
                        writeln!(self.output, "  - {name}")?;
                    }
                }
                let patterns = self.deny.patterns().to_vec();
                if !patterns.is_empty() {
                    writeln!(self.output, "Patterns:")?;
                    for entry in patterns.iter().take(5) {
                        let reason = if entry.reason.is_empty() {
                            "N/A"
                        } else {
                            &entry.reason
                        };
                        writeln!(self.output, "  - {} ({reason})", entry.pattern)?;
                    }
                }
            }
            "2" => {
                let name = self.prompt("Enter author name: ")?;
                let _reason = self.prompt("Reason: ")?;
                self.deny.add_exact(&name)?;
                writeln!(self.output, "✓ Added '{name}' to deny-list")?;
            }
            "3" => {
                let pattern = self.prompt("Enter regex pattern: ")?;
                let reason = self.prompt("Reason: ")?;
                self.deny.add_pattern(&pattern, &reason)?;
                writeln!(self.output, "✓ Added pattern to deny-list")?;
            }
            _ => {}
        }
        Ok(())
    }

    fn print_summary(&mut self) -> Result<()> {
        writeln!(self.output, "\n{RULE}")?;
        writeln!(self.output, "SUMMARY")?;
        writeln!(self.output, "{RULE}")?;
        writeln!(self.output, "Changes made: {}", self.changes_made.len())?;
        let changes = self.changes_made.clone();
        for change in changes {
            writeln!(self.output, "  ✓ {change}")?;
        }

        if !self.skipped.is_empty() {
            writeln!(self.output, "\nSkipped: {}", self.skipped.len())?;
            let skipped = self.skipped.clone();
            for name in skipped.iter().take(5) {
                writeln!(self.output, "  - {name}")?;
            }
            if skipped.len() > 5 {
                writeln!(self.output, "  ... and {} more", skipped.len() - 5)?;
            }
        }

        writeln!(self.output, "\nExport options:")?;
        if self
            .prompt("Export changelog? (yes/no): ")?
            .eq_ignore_ascii_case("yes")
        {
            self.ledger.export("author_changes_export.json")?;
            writeln!(self.output, "✓ Exported changelog")?;
        }
        if self
            .prompt("Export allow-list? (yes/no): ")?
            .eq_ignore_ascii_case("yes")
        {
            self.allow.export("author_allowlist_export.json")?;
            writeln!(self.output, "✓ Exported allow-list")?;
        }
        if self
            .prompt("Export deny-list? (yes/no): ")?
            .eq_ignore_ascii_case("yes")
        {
            self.deny.export("author_denylist_export.json")?;
            writeln!(self.output, "✓ Exported deny-list")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn session_parts(dir: &TempDir) -> (AllowList, DenyList, ChangeLedger) {
        let allow = AllowList::load(dir.path().join("allow.json")).unwrap();
        let deny = DenyList::load(dir.path().join("deny.json")).unwrap();
        let ledger = ChangeLedger::load(dir.path().join("changes.json")).unwrap();
        (allow, deny, ledger)
    }

    fn run_session(store: &Store, dir: &TempDir, script: &str) -> String {
        let (allow, deny, ledger) = session_parts(dir);
        let input = Cursor::new(script.to_string());
        let mut output = Vec::new();
        {
            let mut session = ReviewSession::new(store, allow, deny, ledger, input, &mut output);
            session.run_interactive().unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_accept_suggestion_renames_and_clears_flag() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let author = store.authors().create("C.S. Lewis").unwrap();
        store.authors().mark_for_review(author.id).unwrap();

        let out = run_session(&store, &dir, "2\nno\nno\nno\n");
        assert!(out.contains("Suggested format: C. S. Lewis"));

        let renamed = store.authors().get_or_err(author.id).unwrap();
        assert_eq!(renamed.name, "C. S. Lewis");
        assert!(!renamed.needs_review);

        let ledger = ChangeLedger::load(dir.path().join("changes.json")).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.latest(1)[0].kind, ChangeKind::Renamed);
    }

    #[test]
    fn test_keep_as_is_preserves_flag() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let author = store.authors().create("C.S. Lewis").unwrap();
        store.authors().mark_for_review(author.id).unwrap();

        run_session(&store, &dir, "1\nno\nno\nno\n");

        let kept = store.authors().get_or_err(author.id).unwrap();
        assert_eq!(kept.name, "C.S. Lewis");
        assert!(kept.needs_review);
    }

    #[test]
    fn test_rename_onto_existing_merges_on_confirmation() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let target = store.authors().create("C. S. Lewis").unwrap();
        let source = store.authors().create("C.S. Lewis").unwrap();
        store.quotes().insert("quote a", source.id, None).unwrap();
        store.quotes().insert("quote b", target.id, None).unwrap();
        store.authors().mark_for_review(source.id).unwrap();

        let out = run_session(&store, &dir, "2\nyes\nno\nno\nno\n");
        assert!(out.contains("already exists"));
        assert!(out.contains("Merge complete"));

        assert!(store.authors().get(source.id).unwrap().is_none());
        assert_eq!(store.authors().quote_count(target.id).unwrap(), 2);

        let ledger = ChangeLedger::load(dir.path().join("changes.json")).unwrap();
        assert_eq!(ledger.latest(1)[0].kind, ChangeKind::Merged);
        assert_eq!(
            ledger.latest(1)[0].merged_with.as_deref(),
            Some("C. S. Lewis")
        );
    }

    #[test]
    fn test_declining_merge_leaves_everything_untouched() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        store.authors().create("C. S. Lewis").unwrap();
        let source = store.authors().create("C.S. Lewis").unwrap();
        store.authors().mark_for_review(source.id).unwrap();

        let out = run_session(&store, &dir, "2\nno\nno\nno\nno\n");
        assert!(out.contains("Cancelled - no changes made"));
        assert!(store.authors().get(source.id).unwrap().is_some());
    }

    #[test]
    fn test_allow_list_option_records_name() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let author = store.authors().create("UnUsual Name").unwrap();
        store.authors().mark_for_review(author.id).unwrap();

        run_session(&store, &dir, "4\nno\nno\nno\n");

        let allow = AllowList::load(dir.path().join("allow.json")).unwrap();
        assert!(allow.contains("UnUsual Name"));
        // Allow-listing skips, it does not clear the flag.
        assert!(store.authors().get_or_err(author.id).unwrap().needs_review);
    }

    #[test]
    fn test_delete_option_removes_author_and_quotes() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let author = store.authors().create("random$$garbage").unwrap();
        store.quotes().insert("junk", author.id, None).unwrap();
        store.authors().mark_for_review(author.id).unwrap();

        run_session(&store, &dir, "6\nyes\nno\nno\nno\n");

        assert!(store.authors().get(author.id).unwrap().is_none());
        assert_eq!(store.quotes().count().unwrap(), 0);
        let ledger = ChangeLedger::load(dir.path().join("changes.json")).unwrap();
        assert_eq!(ledger.latest(1)[0].kind, ChangeKind::Deleted);
    }

    #[test]
    fn test_batch_auto_fix_applies_suggestions_and_merges() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let plain = store.authors().create("J.R.R. Tolkien").unwrap();
        let target = store.authors().create("C. S. Lewis").unwrap();
        let colliding = store.authors().create("C.S. Lewis").unwrap();
        store.quotes().insert("lewis quote", colliding.id, None).unwrap();
        store.authors().mark_for_review(plain.id).unwrap();
        store.authors().mark_for_review(colliding.id).unwrap();

        let (allow, deny, ledger) = session_parts(&dir);
        let input = Cursor::new("no\nno\nno\n".to_string());
        let mut output = Vec::new();
        {
            let mut session =
                ReviewSession::new(&store, allow, deny, ledger, input, &mut output);
            session.run_batch(true).unwrap();
        }

        let fixed = store.authors().get_or_err(plain.id).unwrap();
        assert_eq!(fixed.name, "J. R. R. Tolkien");
        assert!(store.authors().get(colliding.id).unwrap().is_none());
        assert_eq!(store.authors().quote_count(target.id).unwrap(), 1);
    }

    #[test]
    fn test_undo_prints_notice_only() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let (allow, deny, mut ledger) = session_parts(&dir);
        ledger
            .append(ChangeKind::Renamed, 1, "Old", "New", None)
            .unwrap();

        let input = Cursor::new(String::new());
        let mut output = Vec::new();
        {
            let mut session = ReviewSession::new(&store, allow, deny, ledger, input, &mut output);
            session.undo_last_change().unwrap();
        }
        let out = String::from_utf8(output).unwrap();
        assert!(out.contains("not yet implemented"));
    }

    #[test]
    fn test_empty_queue_short_circuits() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_memory().unwrap();
        let out = run_session(&store, &dir, "");
        assert!(out.contains("No authors need editing"));
    }
}
