// FICHIER : src-server/src/main.rs

use stac_server::api::{build_router, ApiState};
use stac_server::stac::Session;
use stac_server::utils::{init_logging, AppConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("⚠️ Gestionnaire Ctrl+C indisponible : {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("⚠️ Gestionnaire SIGTERM indisponible : {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("🛑 Ctrl+C reçu, arrêt en cours..."),
        () = terminate => info!("🛑 SIGTERM reçu, arrêt en cours..."),
    }
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Erreur fatale de configuration : {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config);
    info!("🚀 Démarrage du serveur STAC...");

    // --- STOCKAGE ---
    let session = match Session::connect(&config.storage).await {
        Ok(s) => s,
        Err(e) => {
            error!("❌ Stockage indisponible : {}", e);
            std::process::exit(1);
        }
    };

    // --- HTTP ---
    let app = build_router(ApiState::new(session.clone(), &config));
    let addr = config.listen_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("❌ Impossible d'écouter sur {} : {}", addr, e);
            session.close().await;
            std::process::exit(1);
        }
    };
    info!("🌐 API STAC à l'écoute sur http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Serveur HTTP interrompu : {}", e);
    }

    session.close().await;
    info!("👋 Arrêt terminé.");
}
