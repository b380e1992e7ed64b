//! Exemple d'utilisation basique de pmozcs
//!
//! Cet exemple montre comment :
//! - Charger la configuration (fichier YAML + variables `PMOZCS__*`)
//! - Se connecter et s'authentifier
//! - Récupérer un compte et son quota
//!
//! Usage : `cargo run --example basic_usage -- zcs.yaml chris@example.com`

use pmozcs::admin::{AccountAdmin, AccountBy};
use pmozcs::{SoapClient, ZcsConfig};
use std::env;

fn main() -> anyhow::Result<()> {
    // Initialiser le logging (RUST_LOG=pmozcs::wire=debug pour voir les enveloppes)
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "zcs.yaml".to_string());
    let account_name = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: basic_usage <config.yaml> <account>"))?;

    println!("=== PMOZcs - Exemple d'utilisation basique ===\n");

    let config = ZcsConfig::load(&config_path)?;
    println!("Connexion à {}...", config.endpoint()?);
    let mut client = SoapClient::from_config(&config)?;
    println!("✓ Connecté\n");

    let mut admin = AccountAdmin::new(&mut client);
    let account = admin.get_account(&account_name, AccountBy::Name, &[])?;

    println!("--- Compte ---");
    println!("  Nom:     {}", account.name().unwrap_or("-"));
    println!("  Id:      {}", account.id().unwrap_or("-"));
    println!("  Statut:  {}", account.account_status().unwrap_or("-"));
    println!("  Serveur: {}", account.host().unwrap_or("-"));

    if let Some(id) = account.id() {
        let usage = admin.get_account_quota_usage(id)?;
        println!("  Quota:   {} / {} octets", usage.used, usage.limit);
    }

    Ok(())
}
