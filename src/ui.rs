// ui.rs
use crate::display::{DisplayCommand, DisplayEvent};
use crate::product::Product;
use chrono::Local;
use colored::*;
use std::io::{self, Write};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// A line typed by the user, once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Refresh,
    Buy { product_id: String, quantity: u32 },
    Help,
    Exit,
}

/// How a catalog row is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Low,
    Medium,
    Healthy,
}

/// Below the threshold is low, below one and a half times the threshold is medium.
pub fn stock_level(product: &Product) -> StockLevel {
    let quantity = f64::from(product.quantity);
    let threshold = f64::from(product.threshold);
    if quantity < threshold {
        StockLevel::Low
    } else if quantity < threshold * 1.5 {
        StockLevel::Medium
    } else {
        StockLevel::Healthy
    }
}

/// Refuses a purchase the last catalog snapshot shows as sold out.
///
/// Products missing from the snapshot are let through; the inventory has the final word.
pub fn sold_out_warning(catalog: &[Product], product_id: &str) -> Option<String> {
    catalog
        .iter()
        .find(|p| p.id == product_id && p.quantity == 0)
        .map(|p| format!("{} is out of stock, wait for the next restock.", p.name))
}

/// Parses one input line.
///
/// # Arguments
/// * `line` - The raw line read from stdin.
///
/// # Returns
/// The command, or the message to show the user when the line is not understood.
pub fn parse_input(line: &str) -> Result<UserInput, String> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("refresh") => Ok(UserInput::Refresh),
        Some("help") => Ok(UserInput::Help),
        Some("exit") | Some("quit") => Ok(UserInput::Exit),
        Some("buy") => {
            let (Some(product_id), Some(quantity), None) = (words.next(), words.next(), words.next())
            else {
                return Err("Usage: buy <product_id> <quantity>".to_string());
            };
            let quantity: i64 = quantity
                .parse()
                .map_err(|_| format!("Invalid quantity: {}", quantity))?;
            if quantity <= 0 {
                return Err("Quantity must be greater than 0.".to_string());
            }
            let quantity = u32::try_from(quantity)
                .map_err(|_| format!("Invalid quantity: {}", quantity))?;
            Ok(UserInput::Buy {
                product_id: product_id.to_string(),
                quantity,
            })
        }
        Some(other) => Err(format!("Unknown command: {} (type 'help')", other)),
        None => Err(String::new()),
    }
}

pub struct UI {
    commands: Sender<DisplayCommand>,
    events: Option<Receiver<DisplayEvent>>,
    /// Last catalog snapshot the render thread received.
    catalog: Arc<Mutex<Vec<Product>>>,
}

impl UI {
    pub fn new(commands: Sender<DisplayCommand>, events: Receiver<DisplayEvent>) -> Self {
        Self {
            commands,
            events: Some(events),
            catalog: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn clear_screen() {
        print!("\x1B[2J\x1B[1;1H");
        let _ = io::stdout().flush();
    }

    fn prompt() {
        print!("> ");
        let _ = io::stdout().flush();
    }

    fn print_help() {
        println!("Available commands:");
        println!("  {} - Reload the product catalog", "refresh".green());
        println!(
            "  {} <product_id> <quantity> - Buy from the inventory",
            "buy".green()
        );
        println!("  help - Show this list");
        println!("  exit - Quit the application");
    }

    fn print_catalog(products: &[Product]) {
        println!("\n{}", "=== Product Catalog ===".bright_cyan());
        println!(
            "{:<14} {:<22} {:>8} {:>10} {:>10}",
            "ID", "Name", "Stock", "Threshold", "Price"
        );
        for product in products {
            let stock = product.quantity.to_string();
            let stock = match stock_level(product) {
                StockLevel::Low => stock.red(),
                StockLevel::Medium => stock.yellow(),
                StockLevel::Healthy => stock.green(),
            };
            println!(
                "{:<14} {:<22} {:>8} {:>10} {:>10.2}",
                product.id, product.name, stock, product.threshold, product.price
            );
        }
    }

    fn print_event(event: DisplayEvent) {
        match event {
            DisplayEvent::Catalog(products) => Self::print_catalog(&products),
            DisplayEvent::Log(line) => {
                println!("[{}] {}", Local::now().format("%H:%M:%S"), line);
            }
            DisplayEvent::PurchaseOutcome { success, text } => {
                let text = if success { text.green() } else { text.red() };
                println!("{} {}", "[PURCHASE]".bright_blue(), text);
            }
        }
    }

    /// Prints the banner, starts the render thread and reads commands until `exit` or end of input.
    pub fn run(&mut self) {
        Self::clear_screen();

        println!("{}", "=== Stockroom: Buyer / Inventory / Supplier ===".bright_cyan());
        Self::print_help();
        println!();

        // Render updates on a separate thread so the prompt stays responsive
        if let Some(events) = self.events.take() {
            let catalog = self.catalog.clone();
            thread::spawn(move || {
                while let Ok(event) = events.recv() {
                    if let DisplayEvent::Catalog(products) = &event {
                        *catalog.lock().unwrap_or_else(PoisonError::into_inner) = products.clone();
                    }
                    // Clear the prompt line
                    print!("\r\x1B[K");
                    Self::print_event(event);
                    Self::prompt();
                }
            });
        }

        loop {
            Self::prompt();

            let mut input = String::new();
            match io::stdin().read_line(&mut input) {
                Ok(0) => break,
                Ok(_) => match parse_input(&input) {
                    Ok(UserInput::Refresh) => {
                        let _ = self.commands.send(DisplayCommand::Refresh);
                    }
                    Ok(UserInput::Buy {
                        product_id,
                        quantity,
                    }) => {
                        let warning = sold_out_warning(
                            &self.catalog.lock().unwrap_or_else(PoisonError::into_inner),
                            &product_id,
                        );
                        match warning {
                            Some(warning) => println!("{}", warning.yellow()),
                            None => {
                                let _ = self.commands.send(DisplayCommand::Purchase {
                                    product_id,
                                    quantity,
                                });
                            }
                        }
                    }
                    Ok(UserInput::Help) => Self::print_help(),
                    Ok(UserInput::Exit) => {
                        println!("Closing the application...");
                        break;
                    }
                    Err(e) if e.is_empty() => {}
                    Err(e) => println!("{}", e.red()),
                },
                Err(e) => {
                    println!("{}", format!("Error reading input: {}", e).red());
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("refresh\n"), Ok(UserInput::Refresh));
        assert_eq!(parse_input("  help "), Ok(UserInput::Help));
        assert_eq!(parse_input("exit"), Ok(UserInput::Exit));
        assert_eq!(
            parse_input("buy LAPTOP001 3"),
            Ok(UserInput::Buy {
                product_id: "LAPTOP001".to_string(),
                quantity: 3
            })
        );
    }

    #[test]
    fn test_parse_rejects_non_positive_quantity() {
        let expected = Err("Quantity must be greater than 0.".to_string());
        assert_eq!(parse_input("buy LAPTOP001 0"), expected);
        assert_eq!(parse_input("buy LAPTOP001 -2"), expected);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_input("buy LAPTOP001").is_err());
        assert!(parse_input("buy LAPTOP001 3 4").is_err());
        assert!(parse_input("buy LAPTOP001 many").is_err());
        assert!(parse_input("sell LAPTOP001 1").is_err());
        assert_eq!(parse_input("   "), Err(String::new()));
    }

    #[test]
    fn test_sold_out_products_are_refused_locally() {
        let catalog = vec![
            Product::new("LAPTOP001", "Dell Laptop", 0, 3, 999.99),
            Product::new("MOUSE001", "Logitech Mouse", 15, 5, 29.99),
        ];
        assert_eq!(
            sold_out_warning(&catalog, "LAPTOP001"),
            Some("Dell Laptop is out of stock, wait for the next restock.".to_string())
        );
        assert_eq!(sold_out_warning(&catalog, "MOUSE001"), None);
        assert_eq!(sold_out_warning(&catalog, "TABLET001"), None);
        assert_eq!(sold_out_warning(&[], "LAPTOP001"), None);
    }

    #[test]
    fn test_stock_level_colours() {
        let level = |quantity| stock_level(&Product::new("P", "Thing", quantity, 4, 1.0));
        assert_eq!(level(3), StockLevel::Low);
        assert_eq!(level(4), StockLevel::Medium);
        assert_eq!(level(5), StockLevel::Medium);
        assert_eq!(level(6), StockLevel::Healthy);
        assert_eq!(level(20), StockLevel::Healthy);
    }
}
