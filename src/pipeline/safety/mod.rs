pub mod escalation;
pub mod fallback;

pub use escalation::{
    escalation_for, escalation_section, opening_line, severity_band_line, ESCALATION_HEADING,
    ESCALATION_NOTICE,
};
pub use fallback::{fallback_response, fallback_tip, intake_failure_response, GENERIC_ERROR_TIP};
