//! # Seed Data Generator
//!
//! Populates the database with a haberdashery catalog and an admin account
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./merceria_dev.db
//! cargo run -p merceria-db --bin seed
//!
//! # Specify database path
//! cargo run -p merceria-db --bin seed -- --db ./data/merceria.db
//! ```
//!
//! ## Generated Products
//! - Ribbons, lace and elastic sold by the meter
//! - Buttons sold by the dozen
//! - Thread, needles, zippers sold by the unit
//! - Measuring tape in centimeters
//!
//! Each product has a code `{FAMILY}-{NN}`, a price and a starting stock.

use std::env;

use merceria_core::{Quantity, UnitOfMeasure, UserRole};
use merceria_db::{Database, DbConfig, NewProduct, NewUser};

/// Product families: (code prefix, unit, [(name, price in cents, stock in units)])
const FAMILIES: &[(&str, UnitOfMeasure, &[(&str, i64, i64)])] = &[
    (
        "CIN",
        UnitOfMeasure::Meter,
        &[
            ("Cinta raso 1cm blanca", 150, 120),
            ("Cinta raso 1cm roja", 150, 80),
            ("Cinta raso 2.5cm azul", 280, 60),
            ("Cinta organza 2cm dorada", 320, 45),
            ("Cinta gros 1.5cm negra", 250, 90),
        ],
    ),
    (
        "ENC",
        UnitOfMeasure::Meter,
        &[
            ("Encaje algodon 3cm", 450, 40),
            ("Encaje nylon 5cm", 600, 25),
            ("Elastico plano 1cm", 90, 200),
            ("Elastico redondo 2mm", 60, 150),
        ],
    ),
    (
        "BOT",
        UnitOfMeasure::Dozen,
        &[
            ("Boton camisa 11mm nacar", 350, 30),
            ("Boton pantalon metalico", 900, 12),
            ("Boton madera 20mm", 780, 8),
            ("Broche presion 12mm", 420, 20),
        ],
    ),
    (
        "HIL",
        UnitOfMeasure::Unit,
        &[
            ("Hilo poliester 500m blanco", 450, 50),
            ("Hilo poliester 500m negro", 450, 50),
            ("Hilo bordar mouline", 180, 150),
            ("Aguja mano surtida x10", 350, 35),
            ("Cierre nylon 20cm", 120, 100),
            ("Cierre metalico 18cm", 250, 60),
        ],
    ),
    (
        "MED",
        UnitOfMeasure::Centimeter,
        &[("Cinta bies 2cm", 5, 5000), ("Velcro 2cm", 8, 3000)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./merceria_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Merceria POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./merceria_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Merceria POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    if db.users().count().await? == 0 {
        let admin = db
            .users()
            .insert(&NewUser {
                username: "admin".to_string(),
                full_name: "Administrador".to_string(),
                role: UserRole::Admin,
            })
            .await?;
        println!("✓ Created admin user (id {})", admin.id);
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    for (family, unit, products) in FAMILIES {
        for (index, (name, price_cents, stock_units)) in products.iter().enumerate() {
            let product = NewProduct {
                code: format!("{}-{:02}", family, index + 1),
                name: name.to_string(),
                description: None,
                unit: *unit,
                stock_milli: Quantity::from_units(*stock_units).milli(),
                price_cents: *price_cents,
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.code, e);
                continue;
            }
            generated += 1;
        }
    }

    println!("✓ Generated {} products", generated);

    let search_results = db.products().search_by_name("cinta", 10).await?;
    println!("  Search 'cinta': {} results", search_results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
