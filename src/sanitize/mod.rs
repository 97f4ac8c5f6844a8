// Author-name sanitization: classification, format suggestions, garbage
// detection, allow/deny lists, the change ledger and the interactive
// review session that ties them together.

pub mod classify;
pub mod detect;
pub mod ledger;
pub mod lists;
pub mod review;
pub mod suggest;

pub use classify::{NameClassifier, Template};
pub use detect::GarbageDetector;
pub use ledger::{Change, ChangeKind, ChangeLedger, DEFAULT_LEDGER_FILE};
pub use lists::{AllowList, DenyList, DEFAULT_ALLOW_FILE, DEFAULT_DENY_FILE};
pub use review::ReviewSession;
pub use suggest::FormatSuggester;
