use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Handle para cancelar um temporizador repetitivo em andamento.
///
/// Um cancelamento feito antes do temporizador iniciar também é respeitado.
#[derive(Clone, Default)]
pub struct CancelHandle(Arc<Notify>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.notify_one();
    }
}

/// Temporizador que dispara um número limitado de vezes
pub struct RepeatingTimer {
    cancel: CancelHandle,
    join: JoinHandle<u32>,
}

impl RepeatingTimer {
    /// Agenda `repetitions` disparos espaçados por `period`; o primeiro ocorre após um período.
    pub fn spawn<F>(period: Duration, repetitions: u32, on_tick: F) -> Self
    where
        F: FnMut(u32) + Send + 'static,
    {
        Self::spawn_with_cancel(CancelHandle::new(), period, repetitions, on_tick)
    }

    /// Igual a `spawn`, usando um handle de cancelamento criado antes
    pub fn spawn_with_cancel<F>(
        cancel: CancelHandle,
        period: Duration,
        repetitions: u32,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut(u32) + Send + 'static,
    {
        let cancelled = Arc::clone(&cancel.0);

        let join = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            let mut fired = 0;
            while fired < repetitions {
                tokio::select! {
                    biased;
                    _ = cancelled.notified() => {
                        log::debug!("Temporizador cancelado após {} disparos", fired);
                        break;
                    }
                    _ = ticker.tick() => {
                        fired += 1;
                        on_tick(fired);
                    }
                }
            }
            fired
        });

        Self { cancel, join }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Aguarda o fim do temporizador e retorna quantos disparos ocorreram
    pub async fn join(self) -> u32 {
        match self.join.await {
            Ok(fired) => fired,
            Err(e) => {
                log::error!("Temporizador interrompido: {}", e);
                0
            }
        }
    }
}
