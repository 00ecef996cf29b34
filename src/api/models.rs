use serde::Deserialize;

pub type ResidentId = i64;

/// Dispositivo associado a um residente
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Device {
    pub id: i64,
}

/// Residente retornado pela API (campos extras são ignorados)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Resident {
    pub id_residente: ResidentId,
    #[serde(default)]
    pub dispositivo: Option<Device>,
}

impl Resident {
    pub fn device_id(&self) -> Option<i64> {
        self.dispositivo.as_ref().map(|d| d.id)
    }
}

/// Leitura pronta para envio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingSubmission {
    pub resident_id: ResidentId,
    pub device_id: i64,
    /// Batimento em bpm inteiros
    pub heart_rate: i64,
}

impl ReadingSubmission {
    pub fn new(resident_id: ResidentId, device_id: i64, bpm: f64) -> Self {
        Self {
            resident_id,
            device_id,
            heart_rate: bpm.round() as i64,
        }
    }
}

/// Alerta enviado ao final de um ciclo crítico
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSubmission {
    pub resident_id: ResidentId,
    pub alert_type: u8,
    pub message: String,
}
