use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use tokio::time::sleep;
use tower::Layer;
use tower::Service;
use tower::ServiceExt;

use flash_limit::AdmissionConfig;
use flash_limit::AdmissionController;
use flash_limit::BlockRatio;
use tower_flash::FlashError;
use tower_flash::ManagedAdmissionLayer;

#[tokio::main]
async fn main() {
    // 1. Setup Gate: 100 permits, 40% of eligible requests shed, sale opens in 20ms
    let config = AdmissionConfig::new(
        100,
        BlockRatio::new(0.4).unwrap(),
        SystemTime::now() + Duration::from_millis(20),
    );
    let gate = Arc::new(AdmissionController::new(config));

    // 2. Setup Managed Layer: 50ms budget for admitted requests
    let max_wait = Duration::from_millis(50);
    let layer = ManagedAdmissionLayer::new(gate.clone(), max_wait);

    // 3. Define a "Work" service
    let service = tower::service_fn(|_| async {
        // Simulate a tiny bit of processing time
        sleep(Duration::from_millis(1)).await;
        Ok::<&str, tower::BoxError>("Request Successful")
    });

    let managed_service = layer.layer(service);

    println!("🚀 Starting Flash Sale...");
    println!("Gate: 100 permits, 40% shedding, opens in 20ms\n");

    // 4. Fire 400 requests, spread over 40ms so some arrive early
    let mut tasks = Vec::new();
    for i in 0..400 {
        let mut svc = managed_service.clone();
        tasks.push(tokio::spawn(async move {
            sleep(Duration::from_micros(100 * i)).await;
            match svc.ready().await {
                Ok(ready_svc) => match ready_svc.call(()).await {
                    Ok(resp) => println!("[{i:03}] ✅ {resp}"),
                    Err(e) => {
                        if let Some(flash_err) = e.downcast_ref::<FlashError>() {
                            println!("[{i:03}] ❌ Rejected: {flash_err}");
                        } else {
                            println!("[{i:03}] 💥 Unexpected Error: {e}");
                        }
                    }
                },
                Err(e) => println!("[{i:03}] ⚠️ Service Unavailable: {e}"),
            }
        }));
    }

    // Wait for all requests to finish
    for task in tasks {
        let _ = task.await;
    }

    println!("\n🏁 Sale closed with {} admissions.", gate.permitted());
}
