use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{AlertSubmission, ResidentId, VitalsApi};
use crate::simulation::heart_data::CriticalKind;

/// Monta o alerta de um evento crítico
pub fn build_alert(resident_id: ResidentId, kind: CriticalKind) -> AlertSubmission {
    AlertSubmission {
        resident_id,
        alert_type: kind.code(),
        message: kind.alert_message().to_string(),
    }
}

/// Dispara o alerta de emergência em segundo plano
pub fn dispatch_alert(
    api: Arc<dyn VitalsApi>,
    resident_id: ResidentId,
    kind: CriticalKind,
) -> JoinHandle<()> {
    let alert = build_alert(resident_id, kind);
    log::warn!("⚠️ ALARME! Residente {}: {}", resident_id, alert.message);

    tokio::spawn(async move {
        match api.submit_alert(alert).await {
            Ok(ack) => log::info!("Alerta registrado para residente {}: {}", resident_id, ack),
            Err(e) => log::error!("Erro ao enviar alerta do residente {}: {}", resident_id, e),
        }
    })
}
