use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{non_blank, round_cents, ProfileSummary};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayrollStatus {
    #[default]
    Draft,
    Approved,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub id: String,
    pub employee_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub net_pay: f64,
    pub status: PayrollStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayrollRecord {
    pub fn gross(&self) -> f64 {
        round_cents(self.base_salary + self.bonus)
    }

    fn amounts(&self) -> PayAmounts {
        PayAmounts {
            base_salary: self.base_salary,
            bonus: self.bonus,
            deductions: self.deductions,
        }
    }

    pub fn from_request(req: &CreatePayrollRequest) -> Result<Self, &'static str> {
        let employee_id = non_blank(req.employee_id.as_deref()).ok_or("employee_id is required")?;
        let period_start = req.period_start.ok_or("period_start is required")?;
        let period_end = req.period_end.ok_or("period_end is required")?;
        if period_end < period_start {
            return Err("period_end cannot be before period_start");
        }
        let amounts = PayAmounts {
            base_salary: req.base_salary.ok_or("base_salary is required")?,
            bonus: req.bonus.unwrap_or(0.0),
            deductions: req.deductions.unwrap_or(0.0),
        };
        let net_pay = amounts.net_pay()?;
        let status = req.status.unwrap_or_default();
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            employee_id,
            period_start,
            period_end,
            base_salary: round_cents(amounts.base_salary),
            bonus: round_cents(amounts.bonus),
            deductions: round_cents(amounts.deductions),
            net_pay,
            status,
            paid_at: (status == PayrollStatus::Paid).then_some(now),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update; net pay is always recomputed from the amounts
    pub fn apply(&mut self, changes: &UpdatePayrollRequest) -> Result<(), &'static str> {
        let mut amounts = self.amounts();
        if let Some(base_salary) = changes.base_salary {
            amounts.base_salary = base_salary;
        }
        if let Some(bonus) = changes.bonus {
            amounts.bonus = bonus;
        }
        if let Some(deductions) = changes.deductions {
            amounts.deductions = deductions;
        }
        let net_pay = amounts.net_pay()?;

        let now = Utc::now();
        self.base_salary = round_cents(amounts.base_salary);
        self.bonus = round_cents(amounts.bonus);
        self.deductions = round_cents(amounts.deductions);
        self.net_pay = net_pay;
        if let Some(status) = changes.status {
            if status != self.status {
                self.paid_at = (status == PayrollStatus::Paid).then_some(now);
            }
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Amounts making up one payslip, validated before they reach the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayAmounts {
    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
}

impl PayAmounts {
    /// Returns the net pay, or a short reason the amounts are unacceptable
    pub fn net_pay(&self) -> Result<f64, &'static str> {
        let amounts = [self.base_salary, self.bonus, self.deductions];
        if amounts.iter().any(|a| !a.is_finite()) {
            return Err("Amounts must be finite numbers");
        }
        if amounts.iter().any(|a| *a < 0.0) {
            return Err("Amounts cannot be negative");
        }
        // net follows the stored, cent-rounded components
        let net = round_cents(
            round_cents(self.base_salary) + round_cents(self.bonus) - round_cents(self.deductions),
        );
        if net < 0.0 {
            return Err("Deductions exceed gross pay");
        }
        Ok(net)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PayrollView {
    #[serde(flatten)]
    pub record: PayrollRecord,
    pub employee: Option<ProfileSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollSummary {
    pub record_count: i64,
    pub total_gross: f64,
    pub total_deductions: f64,
    pub total_net: f64,
    pub by_status: BTreeMap<String, i64>,
}

pub fn payroll_summary(records: &[PayrollRecord]) -> PayrollSummary {
    let mut by_status = BTreeMap::new();
    let (mut gross, mut deductions, mut net) = (0.0, 0.0, 0.0);
    for record in records {
        gross += record.gross();
        deductions += record.deductions;
        net += record.net_pay;
        *by_status.entry(record.status.to_string()).or_insert(0) += 1;
    }
    PayrollSummary {
        record_count: records.len() as i64,
        total_gross: round_cents(gross),
        total_deductions: round_cents(deductions),
        total_net: round_cents(net),
        by_status,
    }
}

/// Parse a `YYYY-MM` pay period into its first day
pub fn parse_period(period: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", period.trim()), "%Y-%m-%d").ok()
}

#[derive(Debug, Deserialize)]
pub struct CreatePayrollRequest {
    pub employee_id: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub base_salary: Option<f64>,
    pub bonus: Option<f64>,
    pub deductions: Option<f64>,
    pub status: Option<PayrollStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePayrollRequest {
    pub base_salary: Option<f64>,
    pub bonus: Option<f64>,
    pub deductions: Option<f64>,
    pub status: Option<PayrollStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ListPayrollQuery {
    pub employee_id: Option<String>,
    pub status: Option<PayrollStatus>,
    pub period: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PayrollSummaryQuery {
    pub period: Option<String>,
}
