use mixpanel_client::{Event, Mixpanel, MixpanelApi, Properties, Update};
use serde_json::json;

#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::FmtSubscriber;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn props(value: serde_json::Value) -> Properties {
    value.as_object().cloned().unwrap_or_default()
}

async fn sign_up(api: &impl MixpanelApi, distinct_id: &str) {
    let profile = Update::set(props(json!({
        "$email": "user@email.com",
        "plan": "free",
    })));
    if let Err(e) = api.update(distinct_id, &profile).await {
        eprintln!("profile update failed: {e}");
    }

    for button in ["signup", "login", "home"] {
        let event = Event::new(props(json!({ "button": button })));
        if let Err(e) = api.track(distinct_id, "button_clicked", &event).await {
            eprintln!("track failed: {e}");
        }
    }

    if let Err(e) = api.alias(distinct_id, "user@email.com").await {
        eprintln!("alias failed: {e}");
    }
}

#[tokio::main]
async fn main() {
    #[cfg(feature = "tracing")]
    init_tracing();

    let mixpanel = Mixpanel::new("YOUR_PROJECT_TOKEN", "YOUR_API_KEY", "YOUR_API_SECRET", "");

    sign_up(&mixpanel, "cp7dg-n36pb-3bcja-caqkm-vcanj").await;
}
