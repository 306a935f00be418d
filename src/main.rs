//! Card Manager - Pokémon card inventory and sales tracking over SQLite.
//!
//! Batch subcommands cover the day-to-day operations; `shell` opens an
//! interactive session where the undo/redo log spans commands.

use card_manager::api::{PokeApiClient, PokemonLookup};
use card_manager::error::{AppError, AppResult};
use card_manager::models::{Card, Sale};
use card_manager::store::{cards, sales};
use card_manager::undo::{Operation, UndoRedoLog};
use card_manager::{csv_export, csv_import, db, stats};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Pokémon card collection manager - inventory, sales and profit tracking
#[derive(Parser, Debug)]
#[command(name = "card_manager")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path_string())]
    database: String,

    #[command(subcommand)]
    command: Command,
}

fn default_db_path_string() -> String {
    db::default_db_path().to_string_lossy().to_string()
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a card to the inventory
    Add {
        name: String,
        set: String,
        number: String,
        #[arg(long, default_value = "")]
        rarity: String,
        #[arg(long, default_value = "")]
        language: String,
        #[arg(long, default_value = "")]
        condition: String,
        #[arg(long, default_value_t = 0.0)]
        purchase_price: f64,
        /// Purchase date as yyyy-mm-dd
        #[arg(long)]
        purchase_date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        source: String,
        #[arg(long, default_value_t = 0.0)]
        current_price: f64,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
    },
    /// List cards, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 50)]
        page_size: i64,
        /// Substring match on name, set or number
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one card with its derived metrics
    Show { id: i64 },
    /// Update prices or quantity of a card
    Edit {
        id: i64,
        #[arg(long)]
        purchase_price: Option<f64>,
        #[arg(long)]
        current_price: Option<f64>,
        #[arg(long)]
        quantity: Option<i64>,
        #[arg(long)]
        condition: Option<String>,
    },
    /// Delete a card (blocked while sales reference it)
    Remove { id: i64 },
    /// Record a sale against a card, decrementing its stock
    Sell {
        card_id: i64,
        price: f64,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
        #[arg(long, default_value_t = 0.0)]
        fee: f64,
        #[arg(long, default_value_t = 0.0)]
        shipping: f64,
        /// Sale date as yyyy-mm-dd; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List sales, newest first
    Sales {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 50)]
        page_size: i64,
        /// Substring match on card name or set
        #[arg(long)]
        search: Option<String>,
        /// Exact sale date filter (yyyy-mm-dd)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a sale, restoring the card's stock
    RemoveSale { id: i64 },
    /// Collection value, spend, earnings and monthly trend
    Dashboard,
    /// Export all cards to CSV
    ExportCards { path: PathBuf },
    /// Export all sales to CSV
    ExportSales { path: PathBuf },
    /// Bulk-import cards from CSV
    Import { path: PathBuf },
    /// Copy the database file to a backup location
    Backup { dest: PathBuf },
    /// Look up a Pokémon on PokéAPI
    Lookup { name: String },
    /// Interactive session with undo/redo
    Shell,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> AppResult<()> {
    let db_path = PathBuf::from(&args.database);
    let mut conn = db::open(&db_path)?;

    match args.command {
        Command::Add {
            name,
            set,
            number,
            rarity,
            language,
            condition,
            purchase_price,
            purchase_date,
            source,
            current_price,
            quantity,
        } => {
            let card = cards::add_card(
                &conn,
                &Card {
                    id: 0,
                    name,
                    set_name: set,
                    number,
                    rarity,
                    language,
                    condition,
                    purchase_price,
                    purchase_date,
                    source,
                    current_price,
                    quantity,
                    version: 0,
                },
            )?;
            println!("Added card {} ({})", card.id, card.name);
        }
        Command::List {
            page,
            page_size,
            search,
        } => {
            let total = cards::count_cards(&conn, search.as_deref())?;
            let page_cards = cards::get_cards_paged(&conn, page, page_size, search.as_deref())?;
            for card in &page_cards {
                println!(
                    "#{:<5} {:<28} {:<20} {:>4}x  buy {:>8.2}  now {:>8.2}",
                    card.id, card.name, card.set_name, card.quantity, card.purchase_price,
                    card.current_price
                );
            }
            println!("{} of {} cards", page_cards.len(), total);
        }
        Command::Show { id } => {
            let card = cards::get_card(&conn, id)?.ok_or(AppError::NotFound {
                entity: "card",
                id,
            })?;
            println!("{} - {} #{} ({})", card.name, card.set_name, card.number, card.rarity);
            println!("  condition: {}  language: {}", card.condition, card.language);
            println!(
                "  quantity: {}  purchase: {:.2}  current: {:.2}",
                card.quantity, card.purchase_price, card.current_price
            );
            println!(
                "  value: {:.2}  est. profit: {:.2}  ROI: {:.1}%",
                card.total_value(),
                card.estimated_profit(),
                card.roi()
            );
        }
        Command::Edit {
            id,
            purchase_price,
            current_price,
            quantity,
            condition,
        } => {
            let mut card = cards::get_card(&conn, id)?.ok_or(AppError::NotFound {
                entity: "card",
                id,
            })?;
            if let Some(p) = purchase_price {
                card.purchase_price = p;
            }
            if let Some(p) = current_price {
                card.current_price = p;
            }
            if let Some(q) = quantity {
                card.quantity = q;
            }
            if let Some(c) = condition {
                card.condition = c;
            }
            let updated = cards::update_card(&conn, &card)?;
            println!("Updated card {} ({})", updated.id, updated.name);
        }
        Command::Remove { id } => {
            if cards::delete_card(&conn, id)? {
                println!("Deleted card {}", id);
            } else {
                println!("Card {} not found", id);
            }
        }
        Command::Sell {
            card_id,
            price,
            quantity,
            fee,
            shipping,
            date,
        } => {
            let sale = sales::add_sale(
                &mut conn,
                &Sale {
                    id: 0,
                    card_id,
                    sale_date: date.unwrap_or_else(|| chrono::Local::now().date_naive()),
                    sale_price: price,
                    fee,
                    shipping_cost: shipping,
                    quantity,
                    version: 0,
                },
            )?;
            println!("Recorded sale {} of card {}", sale.id, sale.card_id);
        }
        Command::Sales {
            page,
            page_size,
            search,
            date,
        } => {
            let total = sales::count_sales(&conn, search.as_deref(), date)?;
            let records = sales::get_sales_paged(&conn, page, page_size, search.as_deref(), date)?;
            for record in &records {
                println!(
                    "#{:<5} {}  {:<28} {:>4}x  sold {:>8.2}  net {:>8.2}",
                    record.sale.id,
                    record.sale.sale_date,
                    record.card_name,
                    record.sale.quantity,
                    record.sale.sale_price,
                    record.net_profit()
                );
            }
            println!("{} of {} sales", records.len(), total);
        }
        Command::RemoveSale { id } => {
            let sale = sales::delete_sale(&mut conn, id)?;
            println!("Deleted sale {}, restored {} units to card {}", id, sale.quantity, sale.card_id);
        }
        Command::Dashboard => {
            let stats = stats::collection_stats(&conn)?;
            println!("Collection value: {:.2}", stats.collection_value);
            println!("Total spent:      {:.2}", stats.total_spent);
            println!("Total earned:     {:.2}", stats.total_earned);
            println!("Average ROI:      {:.1}%", stats.average_roi);
            println!("Total revenue:    {:.2}", sales::total_revenue(&conn)?);
            println!("Total net profit: {:.2}", sales::total_profit(&conn)?);

            let top = stats::profit_by_set(&conn, 5)?;
            if !top.is_empty() {
                println!("\nMost profitable sets:");
                for entry in top {
                    println!("  {:<30} {:>10.2}", entry.set_name, entry.profit);
                }
            }
            let months = stats::sales_by_month(&conn)?;
            if !months.is_empty() {
                println!("\nSales by month:");
                for m in months {
                    println!("  {}  revenue {:>10.2}  profit {:>10.2}", m.month, m.revenue, m.profit);
                }
            }
        }
        Command::ExportCards { path } => {
            let written = csv_export::export_cards_csv(&conn, &path)?;
            println!("Exported {} cards to {}", written, path.display());
        }
        Command::ExportSales { path } => {
            let written = csv_export::export_sales_csv(&conn, &path)?;
            println!("Exported {} sales to {}", written, path.display());
        }
        Command::Import { path } => {
            let report = csv_import::import_cards_csv(&mut conn, &path)?;
            println!(
                "Imported {} of {} rows ({} errors)",
                report.imported,
                report.total_rows,
                report.error_count()
            );
            for error in &report.errors {
                println!("  {}", error);
            }
        }
        Command::Backup { dest } => {
            db::backup_database(conn, &db_path, &dest)?;
            println!("Database backed up to {}", dest.display());
        }
        Command::Lookup { name } => {
            let lookup = PokemonLookup::new(PokeApiClient::new()?);
            match lookup.pokemon(&name).await {
                Some(pokemon) => {
                    println!("#{} {}", pokemon.id, pokemon.name);
                    println!("  types: {}", pokemon.type_names().join(", "));
                    if let Some(url) = pokemon.image_url() {
                        println!("  image: {}", url);
                    }
                    let sets = lookup.suggested_sets(&name).await;
                    println!("  likely sets: {}", sets.join(", "));
                }
                None => println!("No data available for {}", name),
            }
        }
        Command::Shell => run_shell(&mut conn)?,
    }
    Ok(())
}

/// Interactive session: the undo/redo log lives for the whole session.
fn run_shell(conn: &mut Connection) -> AppResult<()> {
    let mut log = UndoRedoLog::new();
    println!("card_manager shell - 'help' for commands, 'quit' to leave");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = parts.split_first() else {
            continue;
        };
        let result = match command {
            "quit" | "exit" => break,
            "help" => {
                print_shell_help();
                Ok(())
            }
            "list" => shell_list(conn, rest.first().copied()),
            "add" => shell_add(conn, &mut log, rest),
            "sell" => shell_sell(conn, &mut log, rest),
            "delete-card" => shell_delete_card(conn, &mut log, rest),
            "delete-sale" => shell_delete_sale(conn, &mut log, rest),
            "undo" => match log.undo(conn) {
                Ok(Some(desc)) => {
                    println!("Undone: {}", desc);
                    Ok(())
                }
                Ok(None) => {
                    println!("Nothing to undo");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "redo" => match log.redo(conn) {
                Ok(Some(desc)) => {
                    println!("Redone: {}", desc);
                    Ok(())
                }
                Ok(None) => {
                    println!("Nothing to redo");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "history" => {
                match log.undo_description() {
                    Some(desc) => println!("Next undo: {}", desc),
                    None => println!("Next undo: -"),
                }
                match log.redo_description() {
                    Some(desc) => println!("Next redo: {}", desc),
                    None => println!("Next redo: -"),
                }
                Ok(())
            }
            other => {
                println!("Unknown command '{}', try 'help'", other);
                Ok(())
            }
        };
        // Shell errors are informational, never fatal
        if let Err(e) = result {
            println!("Error: {}", e);
        }
    }
    Ok(())
}

fn print_shell_help() {
    println!("  list [search]                 list cards");
    println!("  add <name> <set> <number>     add a card");
    println!("  sell <card_id> <price> [qty]  record a sale");
    println!("  delete-card <id>              delete a card");
    println!("  delete-sale <id>              delete a sale, restore stock");
    println!("  undo / redo                   step through the session history");
    println!("  history                       show the pending undo/redo");
    println!("  quit                          leave the shell");
}

fn shell_list(conn: &Connection, search: Option<&str>) -> AppResult<()> {
    let page = cards::get_cards_paged(conn, 1, 50, search)?;
    for card in &page {
        println!(
            "#{:<5} {:<28} {:<20} {:>4}x",
            card.id, card.name, card.set_name, card.quantity
        );
    }
    Ok(())
}

fn shell_add(conn: &Connection, log: &mut UndoRedoLog, args: &[&str]) -> AppResult<()> {
    let [name, set, number] = args else {
        println!("Usage: add <name> <set> <number>");
        return Ok(());
    };
    let card = cards::add_card(
        conn,
        &Card {
            id: 0,
            name: name.to_string(),
            set_name: set.to_string(),
            number: number.to_string(),
            rarity: String::new(),
            language: String::new(),
            condition: String::new(),
            purchase_price: 0.0,
            purchase_date: None,
            source: String::new(),
            current_price: 0.0,
            quantity: 1,
            version: 0,
        },
    )?;
    println!("Added card {} ({})", card.id, card.name);
    log.record(Operation::AddCard(card));
    Ok(())
}

fn shell_sell(conn: &mut Connection, log: &mut UndoRedoLog, args: &[&str]) -> AppResult<()> {
    let (card_id, price, quantity) = match args {
        [id, price] => (parse_i64(id)?, parse_f64(price)?, 1),
        [id, price, qty] => (parse_i64(id)?, parse_f64(price)?, parse_i64(qty)?),
        _ => {
            println!("Usage: sell <card_id> <price> [quantity]");
            return Ok(());
        }
    };
    let sale = sales::add_sale(
        conn,
        &Sale {
            id: 0,
            card_id,
            sale_date: chrono::Local::now().date_naive(),
            sale_price: price,
            fee: 0.0,
            shipping_cost: 0.0,
            quantity,
            version: 0,
        },
    )?;
    println!("Recorded sale {} of card {}", sale.id, sale.card_id);
    log.record(Operation::AddSale(sale));
    Ok(())
}

fn shell_delete_card(conn: &Connection, log: &mut UndoRedoLog, args: &[&str]) -> AppResult<()> {
    let [id] = args else {
        println!("Usage: delete-card <id>");
        return Ok(());
    };
    let id = parse_i64(id)?;
    let Some(snapshot) = cards::get_card(conn, id)? else {
        println!("Card {} not found", id);
        return Ok(());
    };
    cards::delete_card(conn, id)?;
    println!("Deleted card {} ({})", id, snapshot.name);
    log.record(Operation::DeleteCard(snapshot));
    Ok(())
}

fn shell_delete_sale(conn: &mut Connection, log: &mut UndoRedoLog, args: &[&str]) -> AppResult<()> {
    let [id] = args else {
        println!("Usage: delete-sale <id>");
        return Ok(());
    };
    let sale = sales::delete_sale(conn, parse_i64(id)?)?;
    println!("Deleted sale {}, restored {} units", sale.id, sale.quantity);
    log.record(Operation::DeleteSale(sale));
    Ok(())
}

fn parse_i64(value: &str) -> AppResult<i64> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("'{}' is not a whole number", value)))
}

fn parse_f64(value: &str) -> AppResult<f64> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("'{}' is not a number", value)))
}
