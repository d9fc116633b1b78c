use tokio::signal;
use tracing::warn;

#[cfg(unix)]
pub async fn signal_for_shutdown() {
    let terminate = signal::unix::signal(signal::unix::SignalKind::terminate());
    let quit = signal::unix::signal(signal::unix::SignalKind::quit());

    match (terminate, quit) {
        (Ok(mut terminate_signal), Ok(mut quit_signal)) => {
            tokio::select! {
                _ = signal::ctrl_c() => (),
                _ = terminate_signal.recv() => (),
                _ = quit_signal.recv() => (),
            }
        }
        _ => {
            warn!("unix signal handlers unavailable, waiting for ctrl-c only");
            signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
pub async fn signal_for_shutdown() {
    signal::ctrl_c().await.ok();
}
