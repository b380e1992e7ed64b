//! Liste les comptes d'un domaine (hors compte galsync)
//!
//! Usage : `PMOZCS__SERVER=mail.example.com PMOZCS__USERNAME=admin PMOZCS__PASSWORD=secret \
//! cargo run --example list_accounts -- example.com`

use pmozcs::admin::{AccountAdmin, DomainAdmin, DomainBy};
use pmozcs::{SoapClient, ZcsConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let domain_name = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: list_accounts <domain>"))?;

    let mut config = ZcsConfig::default();
    config.namespace = "admin".to_string();
    config.apply_env_overrides()?;

    let mut client = SoapClient::from_config(&config)?;

    let domain = DomainAdmin::new(&mut client).get_domain(&domain_name, DomainBy::Name)?;
    println!(
        "Domaine {} (COS par défaut: {})",
        domain.name().unwrap_or(&domain_name),
        domain.default_cos_id().unwrap_or("-")
    );

    let accounts = AccountAdmin::new(&mut client).get_account_list_by_domain(&domain_name)?;
    println!("{} compte(s)\n", accounts.len());

    for account in &accounts {
        println!(
            "  {:<40} {:<10} {}",
            account.name().unwrap_or("-"),
            account.account_status().unwrap_or("-"),
            account.mail_quota_bytes().map(|q| q.to_string()).unwrap_or_else(|| "-".to_string()),
        );
    }

    Ok(())
}
