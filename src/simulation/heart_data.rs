use rand::Rng;
use serde::Serialize;

/// Limite de variação aleatória por hora do dia em condições normais
pub const HOURLY_VARIATION: [u32; 24] = [
    5, 5, 4, 4, 4, 5, 6, 8, 10, 12, 14, 16, 18, 16, 14, 14, 12, 10, 10, 8, 6, 6, 5, 5,
];

/// Limite de variação usado para leituras exageradas (eventos críticos)
pub const CRITICAL_VARIATION: [u32; 24] = [
    10, 10, 8, 8, 8, 10, 12, 16, 20, 24, 28, 32, 36, 32, 28, 28, 24, 20, 20, 16, 12, 12, 10, 10,
];

/// Probabilidade de o sinal sorteado ser negativo
const NEGATIVE_SIGN_PROBABILITY: f64 = 0.3;

/// Tipos de evento crítico simulados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CriticalKind {
    Arrhythmia = 1,
    Bradycardia = 2,
    Tachycardia = 3,
}

impl CriticalKind {
    pub const ALL: [CriticalKind; 3] = [
        CriticalKind::Arrhythmia,
        CriticalKind::Bradycardia,
        CriticalKind::Tachycardia,
    ];

    /// Converte o código numérico (1, 2 ou 3); 0 e demais valores não são críticos
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CriticalKind::Arrhythmia),
            2 => Some(CriticalKind::Bradycardia),
            3 => Some(CriticalKind::Tachycardia),
            _ => None,
        }
    }

    /// Código enviado como `alertaTipo`
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Texto do alerta enviado à API
    pub fn alert_message(self) -> &'static str {
        match self {
            CriticalKind::Arrhythmia => "Se presenta Arritmia",
            CriticalKind::Bradycardia => "Se presenta Braquicardia",
            CriticalKind::Tachycardia => "Se presenta Taquicardia",
        }
    }

    /// Sorteia um tipo crítico com probabilidades iguais
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll < 1.0 / 3.0 {
            CriticalKind::Arrhythmia
        } else if roll < 2.0 / 3.0 {
            CriticalKind::Bradycardia
        } else {
            CriticalKind::Tachycardia
        }
    }
}

/// Leitura simulada: valor normal e variante crítica
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub heart_rate: f64,
    pub modified_heart_rate: f64,
}

impl Reading {
    /// Arredonda os dois campos para 2 casas decimais
    pub fn rounded(self) -> Self {
        Self {
            heart_rate: round2(self.heart_rate),
            modified_heart_rate: round2(self.modified_heart_rate),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn draw_sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen_bool(NEGATIVE_SIGN_PROBABILITY) {
        -1.0
    } else {
        1.0
    }
}

/// Gera um batimento para a hora informada usando a tabela normal
pub fn generate_heart_rate<R: Rng + ?Sized>(baseline: f64, hour: u32, rng: &mut R) -> f64 {
    generate_heart_rate_from(&HOURLY_VARIATION, baseline, hour, rng)
}

/// Gera um batimento exagerado usando a tabela de variação crítica
pub fn generate_exaggerated_heart_rate<R: Rng + ?Sized>(
    baseline: f64,
    hour: u32,
    rng: &mut R,
) -> f64 {
    generate_heart_rate_from(&CRITICAL_VARIATION, baseline, hour, rng)
}

/// Aplica a fórmula por faixa horária sobre uma tabela de variação.
///
/// Horas fora de 0..=23 retornam 0.0, sem validação.
pub fn generate_heart_rate_from<R: Rng + ?Sized>(
    table: &[u32; 24],
    baseline: f64,
    hour: u32,
    rng: &mut R,
) -> f64 {
    let Some(&variation) = table.get(hour as usize) else {
        return 0.0;
    };
    let offset = rng.gen_range(0..=variation) as f64;
    let sign = draw_sign(rng);

    match hour {
        // Sono: tendência de queda
        0..=6 => baseline - baseline * rng.gen_range(0.09..0.15) - offset / 1.65,
        // Despertar
        7..=8 => baseline + offset * sign - 5.0,
        // Atividade diurna
        9..=16 => {
            if sign < 0.0 {
                baseline + baseline * rng.gen_range(0.05..0.15) - offset / 5.0
            } else {
                baseline + offset
            }
        }
        // Atividade moderada
        17..=19 => {
            if sign < 0.0 {
                baseline - offset / 5.0
            } else {
                baseline + offset
            }
        }
        20..=21 => baseline - baseline * rng.gen_range(0.0..0.05) + 3.0,
        22..=23 => baseline - baseline * rng.gen_range(0.0..0.05) - offset / 2.0,
        _ => 0.0,
    }
}

/// Gera a leitura normal e, se houver tipo crítico, a variante modificada.
///
/// Sem tipo crítico o valor modificado permanece 0.0.
pub fn generate_variation<R: Rng + ?Sized>(
    baseline: f64,
    hour: u32,
    kind: Option<CriticalKind>,
    rng: &mut R,
) -> Reading {
    let heart_rate = generate_heart_rate(baseline, hour, rng);
    let modified_heart_rate = match kind {
        None => 0.0,
        Some(CriticalKind::Arrhythmia) => {
            heart_rate * 0.70 + heart_rate * rng.gen_range(0.0..0.30)
        }
        Some(CriticalKind::Bradycardia) => {
            let sign = draw_sign(rng);
            heart_rate * 0.65 + sign * baseline * rng.gen_range(0.0..0.05)
        }
        Some(CriticalKind::Tachycardia) => {
            let sign = draw_sign(rng);
            heart_rate * 1.30 + sign * baseline * rng.gen_range(0.0..0.05)
        }
    };

    Reading {
        heart_rate,
        modified_heart_rate,
    }
}
