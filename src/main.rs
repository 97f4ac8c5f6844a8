use std::env;
use std::io;

use anyhow::Result;

use quotekeeper::importer::{
    ImportConfig, Importer, DEFAULT_CATEGORIES_FILE, DEFAULT_CHECKPOINT_FILE,
};
use quotekeeper::sanitize::{
    AllowList, ChangeLedger, DenyList, ReviewSession, DEFAULT_ALLOW_FILE, DEFAULT_DENY_FILE,
    DEFAULT_LEDGER_FILE,
};
use quotekeeper::{Store, DEFAULT_DB_PATH};

fn main() -> Result<()> {
    colog::init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "import" {
        run_import()?;
    } else {
        run_sanitizer()?;
    }

    Ok(())
}

fn run_import() -> Result<()> {
    println!("============================================================");
    println!("THEQUOTESHUB.COM BATCH IMPORTER");
    println!("============================================================");

    let store = Store::open(DEFAULT_DB_PATH)?;
    let importer = Importer::new(&store).checkpoint_path(DEFAULT_CHECKPOINT_FILE);

    if std::path::Path::new(DEFAULT_CATEGORIES_FILE).exists() {
        importer.load_categories(DEFAULT_CATEGORIES_FILE)?;
    } else {
        log::warn!("{DEFAULT_CATEGORIES_FILE} not found, skipping category setup");
    }

    importer.print_database_stats()?;
    importer.print_checkpoint_info()?;

    println!("\nStarting full import with auto-resume...");
    importer.run(&ImportConfig::default())?;

    importer.print_database_stats()?;
    Ok(())
}

fn run_sanitizer() -> Result<()> {
    let store = Store::open(DEFAULT_DB_PATH)?;
    let allow = AllowList::load(DEFAULT_ALLOW_FILE)?;
    let deny = DenyList::load(DEFAULT_DENY_FILE)?;
    let ledger = ChangeLedger::load(DEFAULT_LEDGER_FILE)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = ReviewSession::new(&store, allow, deny, ledger, stdin.lock(), stdout.lock());
    session.run_menu()?;
    Ok(())
}
