//! Row types, request bodies and response views for every admin resource

pub mod attendance;
pub mod lead;
pub mod payroll;
pub mod profile;
pub mod session;
pub mod stats;
pub mod subscription;
pub mod task;
pub mod ticket;
pub mod verification;

pub use attendance::*;
pub use lead::*;
pub use payroll::*;
pub use profile::*;
pub use session::*;
pub use stats::*;
pub use subscription::*;
pub use task::*;
pub use ticket::*;
pub use verification::*;

/// Round a currency amount to whole cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Trim a free-text field, treating blank input as absent
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(10.004), 10.0);
        assert_eq!(round_cents(10.006), 10.01);
        assert_eq!(round_cents(-3.333), -3.33);
        assert_eq!(round_cents(1999.0), 1999.0);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Acme ")), Some("Acme".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
