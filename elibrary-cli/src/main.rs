use clap::{Parser, Subcommand, ValueEnum};
use elibrary::{
    borrow, format_book_line, list_by_category, seed, Book, BookId, BorrowError, RecordStore,
    SeedOutcome, SqliteStore,
};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Category shown by the menu and by `list` without an argument.
const DEFAULT_CATEGORY: &str = "Engineering";

/// Exit status when the catalog refused a request (unknown id, already borrowed, ...).
const EXIT_REJECTED: i32 = 2;

/// E-Library CLI — seed, borrow and browse the book catalog
#[derive(Parser)]
#[command(name = "elibrary", version, about)]
struct Cli {
    /// Path to the catalog database
    #[arg(long, env = "ELIBRARY_DB", default_value = "library.db")]
    db: PathBuf,

    /// JSON dataset used by `seed`
    #[arg(long, env = "ELIBRARY_SEED_FILE", default_value = "data/seed_data.json")]
    seed_file: PathBuf,

    /// Output format for one-shot commands
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    /// Command to run; the interactive menu starts when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Command {
    /// Load the seed dataset into an empty catalog
    Seed,

    /// Borrow a book
    Borrow {
        /// Book ID (24 hex characters)
        id: String,
        /// Borrower name; prompted for when omitted
        #[arg(long)]
        borrower: Option<String>,
    },

    /// List the books in a category
    List {
        /// Category name
        #[arg(default_value = DEFAULT_CATEGORY)]
        category: String,
    },

    /// Show a single book and its borrow history
    Get {
        /// Book ID (24 hex characters)
        id: String,
    },

    /// Run the interactive menu
    Menu,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("ERROR:{e}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn run(cli: Cli) -> CliResult<i32> {
    let store = SqliteStore::open(&cli.db)?;

    let report = match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_menu(&store, &cli.seed_file, &mut stdin.lock(), &mut stdout.lock())?;
            return Ok(0);
        }

        Command::Seed => seed_report(&store, &cli.seed_file)?,

        Command::Borrow { id, borrower } => match borrower {
            Some(name) => borrow_report(&store, &id, &name)?,
            None => match borrow_precheck(&store, &id)? {
                Some(rejection) => rejection,
                None => {
                    eprint!("Enter Borrower Name: ");
                    io::stderr().flush()?;
                    match read_trimmed_line(&mut io::stdin().lock())? {
                        Some(name) if !name.is_empty() => borrow_report(&store, &id, &name)?,
                        _ => Report::rejected("Borrower name cannot be empty."),
                    }
                }
            },
        },

        Command::List { category } => list_report(&store, &category)?,

        Command::Get { id } => get_report(&store, &id)?,
    };

    emit(&mut io::stdout().lock(), &report, cli.format)?;
    Ok(if report.ok { 0 } else { EXIT_REJECTED })
}

/// Outcome of one command: a console message plus its structured form.
struct Report {
    ok: bool,
    text: String,
    data: serde_json::Value,
}

impl Report {
    fn ok(text: impl Into<String>, data: serde_json::Value) -> Self {
        Report {
            ok: true,
            text: text.into(),
            data,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        let text = message.into();
        let data = serde_json::json!({ "ok": false, "error": text });
        Report {
            ok: false,
            text,
            data,
        }
    }
}

fn emit(out: &mut impl Write, report: &Report, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", report.text)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report.data)?)?,
        OutputFormat::Yaml => write!(out, "{}", serde_yaml::to_string(&report.data)?)?,
    }
    Ok(())
}

fn seed_report(store: &impl RecordStore, seed_file: &Path) -> CliResult<Report> {
    match seed(store, seed_file) {
        Ok(SeedOutcome::Seeded { inserted }) => Ok(Report::ok(
            format!("Seeded {inserted} books into the database."),
            serde_json::json!({ "ok": true, "inserted": inserted }),
        )),
        Ok(SeedOutcome::AlreadySeeded { existing }) => Ok(Report::ok(
            format!("Database already seeded ({existing} books found). Skipping."),
            serde_json::json!({ "ok": true, "inserted": 0, "existing": existing }),
        )),
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => Ok(Report::rejected(format!("Error: {e}"))),
    }
}

fn borrow_report(store: &impl RecordStore, id: &str, borrower: &str) -> CliResult<Report> {
    match borrow(store, id, borrower) {
        Ok(confirmation) => Ok(Report::ok(
            format!(
                "Book '{}' successfully borrowed by {}.",
                confirmation.title, confirmation.borrower
            ),
            serde_json::json!({
                "ok": true,
                "id": confirmation.id,
                "title": confirmation.title,
                "borrower": confirmation.borrower,
                "borrowDate": confirmation.borrowed_at,
            }),
        )),
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => Ok(Report::rejected(e.to_string())),
    }
}

/// Refuse a borrow before asking for a name: malformed id, unknown book or
/// a book that is already out. `borrow` still enforces all of these itself.
fn borrow_precheck(store: &impl RecordStore, id: &str) -> CliResult<Option<Report>> {
    let book_id = match BookId::parse(id) {
        Ok(book_id) => book_id,
        Err(source) => {
            let err = BorrowError::InvalidIdentifier {
                input: id.to_string(),
                source,
            };
            return Ok(Some(Report::rejected(err.to_string())));
        }
    };

    let rejection = match store.find_by_id(&book_id)? {
        None => BorrowError::NotFound(book_id),
        Some(book) if book.is_borrowed() => BorrowError::AlreadyBorrowed { title: book.title },
        Some(_) => return Ok(None),
    };
    Ok(Some(Report::rejected(rejection.to_string())))
}

fn list_report(store: &impl RecordStore, category: &str) -> CliResult<Report> {
    let listing = list_by_category(store, category);
    let books = listing.fetch()?;

    let mut text = format!("\n--- {} Books ---", listing.category());
    if books.is_empty() {
        text.push_str(&format!(
            "\nNo {} books found.",
            listing.category().to_lowercase()
        ));
    }
    for book in &books {
        text.push('\n');
        text.push_str(&format_book_line(book));
    }

    Ok(Report::ok(text, serde_json::to_value(&books)?))
}

fn get_report(store: &impl RecordStore, id: &str) -> CliResult<Report> {
    let book_id = match BookId::parse(id) {
        Ok(book_id) => book_id,
        Err(_) => return Ok(Report::rejected(format!("Invalid ID format: {id}"))),
    };
    let Some(book) = store.find_by_id(&book_id)? else {
        return Ok(Report::rejected(format!("Book with ID '{id}' not found.")));
    };

    Ok(Report::ok(describe_book(&book), serde_json::to_value(&book)?))
}

fn describe_book(book: &Book) -> String {
    let mut text = format!("{}\nCategory: {}", format_book_line(book), book.category);
    if book.borrow_history.is_empty() {
        text.push_str("\nNever borrowed.");
    }
    for event in &book.borrow_history {
        text.push_str(&format!(
            "\n  - {} on {}",
            event.borrower,
            event.borrow_date.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    text
}

/// Interactive loop. Ends on the exit option or when input runs out.
fn run_menu<R: BufRead, W: Write>(
    store: &impl RecordStore,
    seed_file: &Path,
    input: &mut R,
    out: &mut W,
) -> CliResult<()> {
    loop {
        writeln!(out, "\n--- E-Library Menu ---")?;
        writeln!(out, "1. Bootstrapper (Seed Data)")?;
        writeln!(out, "2. Borrow Book (Update with Log)")?;
        writeln!(out, "3. Show {DEFAULT_CATEGORY} Books")?;
        writeln!(out, "4. Exit")?;
        write!(out, "Select an option: ")?;
        out.flush()?;

        let Some(choice) = read_trimmed_line(input)? else {
            break;
        };

        let report = match choice.as_str() {
            "1" => seed_report(store, seed_file)?,
            "2" => {
                let Some(id) = prompt(input, out, "Enter Book ID: ")? else {
                    break;
                };
                if let Some(rejection) = borrow_precheck(store, &id)? {
                    rejection
                } else {
                    let Some(borrower) = prompt(input, out, "Enter Borrower Name: ")? else {
                        break;
                    };
                    if borrower.is_empty() {
                        Report::rejected("Borrower name cannot be empty.")
                    } else {
                        borrow_report(store, &id, &borrower)?
                    }
                }
            }
            "3" => list_report(store, DEFAULT_CATEGORY)?,
            "4" => break,
            _ => Report::rejected("Invalid option."),
        };
        emit(out, &report, OutputFormat::Text)?;
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
) -> CliResult<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    read_trimmed_line(input)
}

/// `None` at end of input.
fn read_trimmed_line(input: &mut impl BufRead) -> CliResult<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
