//! lending-ledger CLI
//!
//! Replay loan portfolios and inspect balances from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Replay a portfolio from a JSON file and report balances
//! lending-ledger replay --input portfolio.json
//!
//! # Output as JSON
//! lending-ledger replay --input portfolio.json --format json
//!
//! # Generate a random portfolio for testing
//! lending-ledger generate --loans 25 --payments 4
//! ```

use chrono::Utc;
use lending_ledger::core::account::AccountId;
use lending_ledger::simulation::portfolio::{
    generate_random_portfolio, Portfolio, PortfolioConfig,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"lending-ledger — loan accrual, payment verification and cashback bookkeeping

USAGE:
    lending-ledger <COMMAND> [OPTIONS]

COMMANDS:
    replay      Replay a portfolio file and report loan and cashback balances
    generate    Generate a random portfolio (for testing)
    help        Show this message

OPTIONS (replay):
    --input <FILE>      Path to JSON portfolio file
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --loans <N>         Number of loans (default: 25)
    --payments <N>      Average payments per loan (default: 4)
    --customers <N>     Number of customers (default: 10)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    lending-ledger replay --input portfolio.json
    lending-ledger replay --input portfolio.json --format json
    lending-ledger generate --loans 50 --payments 6 --output test.json"#
    );
}

/// JSON output schema for replay results.
#[derive(serde::Serialize)]
struct ReplayOutput {
    loans: Vec<LoanOutput>,
    balances: Vec<BalanceOutput>,
    total_verified_interest: String,
}

#[derive(serde::Serialize)]
struct LoanOutput {
    name: String,
    customer: String,
    loan_type: String,
    status: String,
    principal: String,
    remaining_principal: String,
    accrued_daily_basis: String,
    accrued_monthly_basis: String,
}

#[derive(serde::Serialize)]
struct BalanceOutput {
    account: String,
    balance: String,
}

fn load_portfolio(path: &str) -> Portfolio {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "system_account": "SYSTEM",
  "loans": [
    {{ "customer": "CUST-001", "name": "LOAN-0001", "principal": "50000",
       "annual_rate": "0.21", "loan_type": "interest_only",
       "frequency": "daily", "created_days_ago": 30 }}
  ],
  "payments": [
    {{ "loan_index": 0, "amount": "800", "verified": true }}
  ]
}}"#
        );
        process::exit(1);
    })
}

fn cmd_replay(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let portfolio = load_portfolio(&path);
    let engine = portfolio.build().unwrap_or_else(|e| {
        eprintln!("Error replaying portfolio: {}", e);
        process::exit(1);
    });

    let now = Utc::now();
    let mut loans: Vec<_> = engine.book().loans().collect();
    loans.sort_by(|a, b| a.name().cmp(b.name()));

    let mut accounts: BTreeSet<String> = engine
        .book()
        .loans()
        .map(|l| l.customer().to_string())
        .collect();
    for tx in engine.cashback().transactions() {
        accounts.insert(tx.to().to_string());
    }

    if format == "json" {
        let loan_outputs: Vec<LoanOutput> = loans
            .iter()
            .map(|loan| {
                let accrued = engine
                    .accrued(loan.id(), now)
                    .expect("loan taken from the book");
                LoanOutput {
                    name: loan.name().to_string(),
                    customer: loan.customer().to_string(),
                    loan_type: format!("{:?}", loan.loan_type()),
                    status: format!("{:?}", loan.status()),
                    principal: loan.principal_amount().to_string(),
                    remaining_principal: loan.remaining_principal().to_string(),
                    accrued_daily_basis: accrued.daily_basis.to_string(),
                    accrued_monthly_basis: accrued.monthly_basis.to_string(),
                }
            })
            .collect();

        let balances: Vec<BalanceOutput> = accounts
            .iter()
            .map(|account| BalanceOutput {
                account: account.clone(),
                balance: engine
                    .cashback()
                    .balance(&AccountId::new(account.as_str()))
                    .to_string(),
            })
            .filter(|b| b.balance != "0")
            .collect();

        let output = ReplayOutput {
            loans: loan_outputs,
            balances,
            total_verified_interest: engine.book().total_verified_interest().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!("Loans ({}):", loans.len());
        for loan in &loans {
            let accrued = engine
                .accrued(loan.id(), now)
                .expect("loan taken from the book");
            println!(
                "  {:<12} {:<10} {:>14} remaining {:>14} accrued {:>12}",
                loan.name(),
                loan.customer(),
                loan.principal_amount(),
                loan.remaining_principal(),
                accrued.daily_basis,
            );
        }
        println!(
            "\nTotal verified interest: {}",
            engine.book().total_verified_interest()
        );

        println!("\nCashback balances:");
        for account in &accounts {
            let balance = engine.cashback().balance(&AccountId::new(account.as_str()));
            if balance != Decimal::ZERO {
                println!("  {:<12} {:>12}", account, balance);
            }
        }
    }
}

fn cmd_generate(args: &[String]) {
    let mut loans = 25usize;
    let mut payments = 4usize;
    let mut customers = 10usize;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--loans" => {
                i += 1;
                loans = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--loans requires a number");
                    process::exit(1);
                });
            }
            "--payments" => {
                i += 1;
                payments = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--payments requires a number");
                    process::exit(1);
                });
            }
            "--customers" => {
                i += 1;
                customers = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--customers requires a number");
                    process::exit(1);
                });
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = PortfolioConfig {
        customer_count: customers.max(1),
        loan_count: loans.max(1),
        avg_payments_per_loan: payments,
        ..Default::default()
    };

    let portfolio = generate_random_portfolio(&config);
    let json = serde_json::to_string_pretty(&portfolio).unwrap();

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} loans with {} payments → {}",
            portfolio.loans.len(),
            portfolio.payments.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "replay" => cmd_replay(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
