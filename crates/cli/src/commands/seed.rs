//! Seed the database with catalog products, users and delivery addresses.
//!
//! Reads a YAML fixtures file, validates it before touching the database, and
//! upserts every entry. Products are keyed by name, users by email and
//! addresses by (user, street, zipcode), so re-running the same file refreshes
//! rather than duplicates them.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use greencart_server::db::{
    self, AddressRepository, NewAddress, NewProduct, ProductRepository, UserRepository,
};

use super::migrate::database_url;

/// Top-level fixtures document.
#[derive(Debug, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub products: Vec<NewProduct>,
    #[serde(default)]
    pub users: Vec<UserFixture>,
}

/// A user and the addresses they own.
#[derive(Debug, Deserialize)]
pub struct UserFixture {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub addresses: Vec<NewAddress>,
}

/// Counts of what a seed run wrote.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub products: usize,
    pub users: usize,
    pub addresses: usize,
}

/// Check a fixtures document for mistakes the database would not catch.
#[must_use]
pub fn validate_fixtures(fixtures: &Fixtures) -> Vec<String> {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    for product in &fixtures.products {
        if product.name.trim().is_empty() {
            errors.push("product with empty name".to_string());
        }
        if !names.insert(product.name.as_str()) {
            errors.push(format!("duplicate product name: {}", product.name));
        }
        if product.price.is_sign_negative() {
            errors.push(format!("{}: negative price", product.name));
        }
        if let Some(offer) = product.offer_price {
            if offer.is_sign_negative() {
                errors.push(format!("{}: negative offer price", product.name));
            } else if offer > product.price {
                errors.push(format!("{}: offer price above list price", product.name));
            }
        }
    }

    let mut emails = HashSet::new();
    for user in &fixtures.users {
        let email = user.email.trim().to_lowercase();
        if !email.contains('@') {
            errors.push(format!("{}: invalid email {:?}", user.name, user.email));
        }
        if !emails.insert(email) {
            errors.push(format!("duplicate user email: {}", user.email));
        }
        let mut keys = HashSet::new();
        for address in &user.addresses {
            if address.street.trim().is_empty() || address.city.trim().is_empty() {
                errors.push(format!("{}: address missing street or city", user.email));
            }
            if !keys.insert((address.street.as_str(), address.zipcode.as_str())) {
                errors.push(format!(
                    "{}: duplicate address {} {}",
                    user.email, address.street, address.zipcode
                ));
            }
        }
    }

    errors
}

/// Seed from a YAML file.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the file cannot be read or
/// fails validation, or a database write fails.
pub async fn run(file_path: &str) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let database_url = database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading fixtures from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let fixtures: Fixtures = serde_yaml::from_str(&content)?;

    info!(
        products = fixtures.products.len(),
        users = fixtures.users.len(),
        "Parsed fixtures"
    );

    let errors = validate_fixtures(&fixtures);
    if !errors.is_empty() {
        error!("Fixture validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let mut summary = SeedSummary::default();

    let products = ProductRepository::new(&pool);
    for product in &fixtures.products {
        let row = products.upsert(product).await?;
        info!(id = %row.id, name = %row.name, "Product upserted");
        summary.products += 1;
    }

    let users = UserRepository::new(&pool);
    let addresses = AddressRepository::new(&pool);
    for user in &fixtures.users {
        let user_id = users.upsert(&user.name, &user.email).await?;
        summary.users += 1;
        for address in &user.addresses {
            addresses.upsert(user_id, address).await?;
            summary.addresses += 1;
        }
        info!(%user_id, email = %user.email, addresses = user.addresses.len(), "User seeded");
    }

    info!("Seeding complete!");
    info!("  Products: {}", summary.products);
    info!("  Users: {}", summary.users);
    info!("  Addresses: {}", summary.addresses);

    Ok(summary)
}
