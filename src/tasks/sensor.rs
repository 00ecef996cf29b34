use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{ReadingSubmission, VitalsApi};

/// Envia uma leitura sem bloquear o ciclo de simulação.
///
/// Falhas são registradas no log e descartadas.
pub fn submit_reading(api: Arc<dyn VitalsApi>, reading: ReadingSubmission) -> JoinHandle<()> {
    tokio::spawn(async move {
        match api.submit_reading(reading).await {
            Ok(ack) => log::debug!(
                "Leitura enviada: residente {} -> {} bpm ({})",
                reading.resident_id,
                reading.heart_rate,
                ack.trim()
            ),
            Err(e) => log::error!(
                "Erro ao enviar leitura do residente {}: {}",
                reading.resident_id,
                e
            ),
        }
    })
}
