//! Quick Start Example
//!
//! Picks a couple of products, asks a node for a routine, then follows up.
//! Expects a node on localhost:3000.

use regimen_sdk::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Connect to a Regimen node
    let client = RegimenClient::connect("http://localhost:3000").await?;
    let mut events = client.events().await?;

    // 1. Pick the first product of each category
    let catalog = client.catalog(None).await?;
    for category in &catalog.categories {
        if let Some(product) = catalog.products.iter().find(|p| &p.category == category) {
            client.toggle(product).await?;
            println!("🧴 Selected {} by {}", product.name, product.brand);
        }
    }

    // 2. Ask for a routine
    match client.generate_routine().await {
        Ok(reply) => println!("✨ Routine:\n{}", reply.content),
        Err(e) => {
            println!("❌ {}", e);
            return Ok(());
        }
    }

    // 3. Follow up
    let answer = client.ask("Can I use this routine every day?").await?;
    println!("💬 {}", answer.content);

    // 4. Drain what the node announced
    while let Ok(Some(event)) =
        tokio::time::timeout(std::time::Duration::from_millis(200), events.next()).await
    {
        match event.kind {
            SessionEventKind::SelectionChanged { count, .. } => {
                println!("📊 Selection: {} product(s)", count);
            }
            SessionEventKind::SendFailed { entry, message } => {
                println!("❌ {} failed: {}", entry, message);
            }
            other => println!("📡 {:?}", other),
        }
    }

    Ok(())
}
