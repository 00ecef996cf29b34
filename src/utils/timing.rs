use chrono::{Local, Timelike};

/// Hora local atual (0..=23)
pub fn current_hour() -> u32 {
    Local::now().hour()
}

/// Horário formatado para mensagens de log
pub fn clock_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
