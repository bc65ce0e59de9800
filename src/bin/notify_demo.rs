//! Sends one sample alert through every configured channel.

use bike_alert::config::AppConfig;
use bike_alert::listing::ListingDetail;
use bike_alert::NotifierMux;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = AppConfig::load_default()?;
    let mux = NotifierMux::from_config(&cfg.notify)?;

    let sample = ListingDetail {
        title: "50cm Cannondale SuperSix EVO Ultegra Di2".into(),
        price: Some("$1,875".into()),
        bicycle_type: Some("road".into()),
        wheel_size: Some("700C".into()),
        frame_size: Some("50cm".into()),
        frame_material: Some("carbon fiber".into()),
        manufacturer: Some("Cannondale".into()),
        model: Some("SuperSix EVO".into()),
        condition: Some("excellent".into()),
        body: "Shimano Ultegra Di2 2x11 speed electronic shifting, carbon wheels.".into(),
        url: "https://sfbay.craigslist.org/bik/0000000000.html".into(),
    };

    let delivered = mux
        .notify(&sample, "Premium carbon road bike with modern Ultegra Di2 at a fair price")
        .await;
    println!("notify-demo done (delivered: {delivered})");
    Ok(())
}
