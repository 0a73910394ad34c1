//! Print a bcrypt hash suitable for `ADMIN_HASH_PASSWORD`.
//!
//! Usage: cargo run --bin hash-password <PASSWORD> [COST]

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let password = args.next().unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD> [COST]");
        std::process::exit(1);
    });

    let cost = match args.next() {
        Some(raw) => match raw.parse::<u32>() {
            Ok(cost) if (4..=31).contains(&cost) => cost,
            _ => {
                eprintln!("COST must be an integer between 4 and 31, got {}", raw);
                std::process::exit(1);
            }
        },
        None => DEFAULT_COST,
    };

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("\nCost     : {}", cost);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into your .env (ADMIN_PASSWORD is then ignored):");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
