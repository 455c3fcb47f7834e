use chrono::{DateTime, Duration, Utc};
use tokio::time::sleep;
use crate::config::TrackingConfig;
use crate::errors::StoreResult;
use crate::services::Repository;

/// Background loop closing time records whose viewer stopped reporting
/// without a final flush.
pub async fn sweeper_process(repo: Repository, tracking: TrackingConfig) {
    tracing::info!(
        "Session sweeper started (every {}s, timeout {}s)",
        tracking.sweep_interval_secs,
        tracking.session_timeout_secs
    );
    let interval = std::time::Duration::from_secs(tracking.sweep_interval_secs.max(1));
    let timeout = Duration::seconds(tracking.session_timeout_secs);

    loop {
        sleep(interval).await;

        match sweep_stale_sessions(&repo, Utc::now(), timeout).await {
            Ok(0) => tracing::trace!("No stale sessions"),
            Ok(closed) => tracing::info!("Closed {} stale sessions", closed),
            Err(e) => tracing::error!("Failed to sweep stale sessions: {}", e),
        }
    }
}

pub async fn sweep_stale_sessions(
    repo: &Repository,
    now: DateTime<Utc>,
    timeout: Duration,
) -> StoreResult<usize> {
    let cutoff = now - timeout;
    let mut closed = 0;

    for tiempo in repo.list_tiempos().await? {
        if !tiempo.activo || tiempo.fecha_actualizacion >= cutoff {
            continue;
        }

        // Checked again inside the update so a flush that lands meanwhile keeps the record open
        let mut swept = false;
        repo.update_tiempo(&tiempo.id, |current| {
            swept = current.activo && current.fecha_actualizacion < cutoff;
            if swept {
                current.cerrar();
            }
            swept
        })
        .await?;

        if swept {
            tracing::debug!("Closed stale time record {} of user {}", tiempo.id, tiempo.usuario_id);
            closed += 1;
        }
    }

    Ok(closed)
}
