use serde::Serialize;

/// Calendar classification of a work date. Never stored, derived on every
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayType {
    Regular,
    Weekend,
    Holiday,
    PreExistingTimeOff,
}

impl DayType {
    pub fn is_special(&self) -> bool {
        !matches!(self, DayType::Regular)
    }
}
