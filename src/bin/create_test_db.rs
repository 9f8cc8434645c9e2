use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use spendwise::{
    PasswordHash, Transaction, TransactionKind, ValidatedPassword, create_transaction,
    create_user, initialize_db, parse_email,
};

/// A utility for creating a test database for the Spendwise server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many days of demo transactions to create, counting back from today.
    #[arg(long, default_value_t = 120)]
    days: i64,
}

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "test";

/// Recurring demo expenses: description, amount in cents and how often in days.
const DEMO_EXPENSES: [(&str, i64, i64); 5] = [
    ("Coffee", 450, 1),
    ("Groceries", 8_735, 7),
    ("Petrol", 6_200, 10),
    ("Rent", 52_000, 14),
    ("Power bill", 14_310, 30),
];

/// Recurring demo income: description, amount in cents and how often in days.
const DEMO_INCOME: [(&str, i64, i64); 2] = [("Salary", 310_000, 14), ("Interest", 1_250, 30)];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user {DEMO_EMAIL} with the password {DEMO_PASSWORD:?}...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(&parse_email(DEMO_EMAIL)?, password_hash, &conn)?;

    println!("Creating demo transactions...");

    let now = OffsetDateTime::now_utc();
    let mut count = 0;

    for days_ago in (0..args.days).rev() {
        let created_at = now - Duration::days(days_ago);

        let recurring = DEMO_EXPENSES
            .iter()
            .map(|item| (item, TransactionKind::Expense))
            .chain(DEMO_INCOME.iter().map(|item| (item, TransactionKind::Income)));

        for ((description, cents, every_n_days), kind) in recurring {
            if days_ago % every_n_days != 0 {
                continue;
            }

            let amount = Decimal::new(*cents, 2);
            create_transaction(
                Transaction::build(user.id, description, amount, kind).created_at(created_at),
                &conn,
            )?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
