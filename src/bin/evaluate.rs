use storefront_cart_engine::{config::EngineConfig, state::CartEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Operational helper: prices the locally persisted cart against the
// configured authority and prints the result.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_cart_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env()?;
    let engine = CartEngine::with_http_authority(&config)?;

    let items = engine.items();
    if items.is_empty() {
        println!("Cart is empty; nothing to evaluate.");
        return Ok(());
    }

    for item in &items {
        println!(
            "{} x{} @ {} ({})",
            item.name,
            item.quantity,
            item.price,
            item.variant_label.as_deref().unwrap_or("-")
        );
    }

    engine.evaluate_now().await;

    let view = engine.pricing_view();
    match view.result {
        Some(result) => {
            println!("Subtotal: {}", result.pricing.subtotal);
            println!("Discount: {}", result.pricing.discount_amount);
            for promotion in &result.applied_promotions {
                println!(
                    "Promotion {} (-{})",
                    promotion.promotion_name, promotion.discount_amount
                );
            }
            for gift in &result.free_gifts {
                println!("Free gift: {} x{}", gift.name, gift.quantity);
            }
        }
        None => {
            println!(
                "Evaluation produced no result{}",
                if view.evaluation_failed {
                    " (authority unreachable, local subtotal only)"
                } else {
                    ""
                }
            );
            println!("Local subtotal: {}", engine.current_subtotal());
        }
    }

    Ok(())
}
