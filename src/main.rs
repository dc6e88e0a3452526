mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pubtrack",
    version,
    about = "Track publications and the employees who wrote them"
)]
struct Cli {
    /// Path to the database file (default: .pubtrack/pubtrack.db in current dir)
    #[arg(long, env = "PUBTRACK_DB", global = true)]
    db: Option<PathBuf>,

    /// Output as JSON instead of table
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema
    Init,
    /// Serve the REST API
    Serve {
        /// Address to bind
        #[arg(long, env = "PUBTRACK_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(short, long, env = "PUBTRACK_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Manage employees
    Employee {
        #[command(subcommand)]
        action: EmployeeAction,
    },
    /// Manage publications
    Publication {
        #[command(subcommand)]
        action: PublicationAction,
    },
    /// Write every publication as XML
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum EmployeeAction {
    /// Add an employee
    Add {
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        position: Option<String>,
    },
    /// List employees
    List,
}

#[derive(Subcommand)]
enum PublicationAction {
    /// Add a publication
    Add {
        /// Publication title
        title: String,
        /// Kind (article, book, chapter, conference_paper, thesis, other)
        #[arg(short, long, default_value = "article")]
        kind: String,
        /// Publication year
        #[arg(short, long)]
        year: i32,
        #[arg(long)]
        journal: Option<String>,
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        doi: Option<String>,
        #[arg(long)]
        pages: Option<u32>,
        /// Author employee ids (comma-separated, in author order)
        #[arg(short, long, value_delimiter = ',')]
        authors: Vec<i64>,
    },
    /// List publications
    List {
        /// Only this kind
        #[arg(short, long)]
        kind: Option<String>,
        /// Only this year
        #[arg(short, long)]
        year: Option<i32>,
        /// Only publications by this employee id
        #[arg(long)]
        employee: Option<i64>,
        /// Sort keys, e.g. "-year,title"
        #[arg(short, long, allow_hyphen_values = true)]
        sort: Option<String>,
    },
    /// Show one publication
    Show { id: i64 },
    /// Delete a publication
    Delete { id: i64 },
}

fn main() {
    let cli = Cli::parse();
    pubtrack::logging::init(cli.verbose);

    let db_path = cli.db.unwrap_or_else(|| {
        let mut p = std::env::current_dir().expect("cannot determine current directory");
        p.push(".pubtrack");
        p.push("pubtrack.db");
        p
    });

    let result = match cli.command {
        Commands::Init => commands::init::run(&db_path),
        Commands::Serve { host, port } => commands::serve::run(&db_path, &host, port),
        Commands::Employee { action } => match action {
            EmployeeAction::Add {
                first_name,
                last_name,
                email,
                position,
            } => commands::employee::add(
                &db_path,
                &first_name,
                &last_name,
                email.as_deref(),
                position.as_deref(),
                cli.json,
            ),
            EmployeeAction::List => commands::employee::list(&db_path, cli.json),
        },
        Commands::Publication { action } => match action {
            PublicationAction::Add {
                title,
                kind,
                year,
                journal,
                publisher,
                isbn,
                doi,
                pages,
                authors,
            } => commands::publication::add(
                &db_path,
                commands::publication::AddArgs {
                    title,
                    kind,
                    year,
                    journal,
                    publisher,
                    isbn,
                    doi,
                    pages,
                    authors,
                },
                cli.json,
            ),
            PublicationAction::List {
                kind,
                year,
                employee,
                sort,
            } => commands::publication::list(
                &db_path,
                kind.as_deref(),
                year,
                employee,
                sort.as_deref(),
                cli.json,
            ),
            PublicationAction::Show { id } => commands::publication::show(&db_path, id, cli.json),
            PublicationAction::Delete { id } => {
                commands::publication::delete(&db_path, id, cli.json)
            }
        },
        Commands::Export { out } => commands::export::run(&db_path, out.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
