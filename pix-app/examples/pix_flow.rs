//! Walks through a full pix flow against an in-process server.
//!
//! Run with: cargo run -p pix-app --example pix_flow --no-default-features --features sqlite

use pix_client::PixClient;
use pix_hex::{PixService, inbound::HttpServer};
use pix_repo::{HmacKeyCodec, SqliteRepo};
use tempfile::tempdir;
use tokio::net::TcpListener;

fn cents(value: i64) -> f64 {
    value as f64 / 100.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    // File-backed SQLite DB in a temp dir
    let tmp = tempdir()?;
    let db_url = format!("sqlite://{}?mode=rwc", tmp.path().join("pix.db").display());

    let repo = SqliteRepo::new(&db_url).await?;
    let service = PixService::new(repo, HmacKeyCodec::new("example-secret"));
    let router = HttpServer::new(service).router();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("server stopped: {e}");
        }
    });

    println!("🚀 Server on {base_url}, database {db_url}");

    let client = PixClient::new(&base_url);
    println!("✅ Server healthy: {}", client.health().await?);

    let maria = client.create_user("Maria", "Silva", 0).await?;
    let joao = client.create_user("João", "Souza", 10_000).await?;
    println!("✅ Signed up {} and {}", maria.user.first_name, joao.user.first_name);

    let maria_client = PixClient::new(&base_url).with_api_key(maria.api_key);
    let joao_client = PixClient::new(&base_url).with_api_key(joao.api_key);

    let key = maria_client.request_pix(2_500).await?;
    println!("✅ Maria requested R$ {:.2}, key {key}", cents(2_500));

    let self_pay = maria_client.pay_pix(&key).await;
    println!("✅ Maria paying herself fails: {}", self_pay.unwrap_err());

    let paid = joao_client.pay_pix(&key).await?;
    println!("✅ João paid: {}", paid.msg);

    let again = joao_client.pay_pix(&key).await;
    println!("✅ Paying twice fails: {}", again.unwrap_err());

    let maria_now = maria_client.me().await?;
    let joao_now = joao_client.me().await?;
    println!("   Maria wallet: R$ {:.2}", cents(maria_now.wallet));
    println!("   João wallet: R$ {:.2}", cents(joao_now.wallet));

    println!("\n📋 Maria's transactions:");
    for entry in maria_client.transactions().await? {
        println!(
            "   - {:?} R$ {:.2} with {} {} at {}",
            entry.kind,
            cents(entry.value),
            entry.user.first_name,
            entry.user.last_name,
            entry.updated_at
        );
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
