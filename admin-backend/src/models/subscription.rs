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
pub enum BillingInterval {
    #[default]
    Monthly,
    Yearly,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Trialing,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    /// Statuses that still count towards recurring revenue
    pub fn is_billable(&self) -> bool {
        matches!(self, Self::Active | Self::PastDue)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub profile_id: String,
    pub plan: String,
    pub amount: f64,
    pub billing_interval: BillingInterval,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<NaiveDate>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Amount normalised to one month, unrounded
    pub fn monthly_amount(&self) -> f64 {
        match self.billing_interval {
            BillingInterval::Monthly => self.amount,
            BillingInterval::Yearly => self.amount / 12.0,
        }
    }
}

fn check_amount(amount: f64) -> Result<f64, &'static str> {
    if !amount.is_finite() || amount < 0.0 {
        return Err("amount must be a non-negative number");
    }
    Ok(round_cents(amount))
}

impl Subscription {
    pub fn from_request(req: &CreateSubscriptionRequest) -> Result<Self, &'static str> {
        let profile_id = non_blank(req.profile_id.as_deref()).ok_or("profile_id is required")?;
        let plan = non_blank(req.plan.as_deref()).ok_or("plan is required")?;
        let amount = check_amount(req.amount.ok_or("amount is required")?)?;
        let status = req.status.unwrap_or_default();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            profile_id,
            plan,
            amount,
            billing_interval: req.billing_interval.unwrap_or_default(),
            status,
            current_period_end: req.current_period_end,
            canceled_at: (status == SubscriptionStatus::Canceled).then_some(now),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update; canceling stamps `canceled_at`, reactivating clears it
    pub fn apply(&mut self, changes: &UpdateSubscriptionRequest) -> Result<(), &'static str> {
        let now = Utc::now();
        if let Some(amount) = changes.amount {
            self.amount = check_amount(amount)?;
        }
        if let Some(plan) = changes.plan.as_deref() {
            self.plan = non_blank(Some(plan)).ok_or("plan cannot be empty")?;
        }
        if let Some(interval) = changes.billing_interval {
            self.billing_interval = interval;
        }
        if let Some(period_end) = changes.current_period_end {
            self.current_period_end = Some(period_end);
        }
        if let Some(status) = changes.status {
            if status == SubscriptionStatus::Canceled && self.status != SubscriptionStatus::Canceled {
                self.canceled_at = Some(now);
            } else if status != SubscriptionStatus::Canceled {
                self.canceled_at = None;
            }
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub profile: Option<ProfileSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanBreakdown {
    pub plan: String,
    pub subscribers: i64,
    pub mrr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingOverview {
    pub mrr: f64,
    pub arr: f64,
    pub total_subscriptions: i64,
    pub by_status: BTreeMap<String, i64>,
    pub plans: Vec<PlanBreakdown>,
}

pub fn billing_overview(subscriptions: &[Subscription]) -> BillingOverview {
    let mut by_status = BTreeMap::new();
    let mut plans: BTreeMap<&str, (i64, f64)> = BTreeMap::new();
    let mut mrr = 0.0;

    for sub in subscriptions {
        *by_status.entry(sub.status.to_string()).or_insert(0) += 1;
        if sub.status.is_billable() {
            let monthly = sub.monthly_amount();
            mrr += monthly;
            let entry = plans.entry(sub.plan.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += monthly;
        }
    }

    let mrr = round_cents(mrr);
    BillingOverview {
        mrr,
        arr: round_cents(mrr * 12.0),
        total_subscriptions: subscriptions.len() as i64,
        by_status,
        plans: plans
            .into_iter()
            .map(|(plan, (subscribers, plan_mrr))| PlanBreakdown {
                plan: plan.to_string(),
                subscribers,
                mrr: round_cents(plan_mrr),
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub profile_id: Option<String>,
    pub plan: Option<String>,
    pub amount: Option<f64>,
    pub billing_interval: Option<BillingInterval>,
    pub status: Option<SubscriptionStatus>,
    pub current_period_end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub plan: Option<String>,
    pub amount: Option<f64>,
    pub billing_interval: Option<BillingInterval>,
    pub status: Option<SubscriptionStatus>,
    pub current_period_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListSubscriptionsQuery {
    pub status: Option<SubscriptionStatus>,
    pub plan: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(plan: &str, amount: f64, interval: BillingInterval, status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            profile_id: "p1".to_string(),
            plan: plan.to_string(),
            amount,
            billing_interval: interval,
            status,
            current_period_end: None,
            canceled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overview_normalises_yearly_and_skips_unbillable() {
        let subs = vec![
            sub("pro", 49.0, BillingInterval::Monthly, SubscriptionStatus::Active),
            sub("pro", 480.0, BillingInterval::Yearly, SubscriptionStatus::PastDue),
            sub("starter", 19.0, BillingInterval::Monthly, SubscriptionStatus::Trialing),
            sub("starter", 19.0, BillingInterval::Monthly, SubscriptionStatus::Canceled),
            sub("enterprise", 1000.0, BillingInterval::Yearly, SubscriptionStatus::Active),
        ];

        let overview = billing_overview(&subs);
        // 49 + 40 + 83.333...
        assert_eq!(overview.mrr, 172.33);
        assert_eq!(overview.arr, 2067.96);
        assert_eq!(overview.total_subscriptions, 5);
        assert_eq!(overview.by_status.get("active"), Some(&2));
        assert_eq!(overview.by_status.get("past_due"), Some(&1));
        assert_eq!(overview.by_status.get("canceled"), Some(&1));

        let plans: Vec<&str> = overview.plans.iter().map(|p| p.plan.as_str()).collect();
        assert_eq!(plans, vec!["enterprise", "pro"]);
        assert_eq!(overview.plans[1].subscribers, 2);
        assert_eq!(overview.plans[1].mrr, 89.0);
    }

    #[test]
    fn test_cancel_and_reactivate() {
        let mut subscription = sub("pro", 49.0, BillingInterval::Monthly, SubscriptionStatus::Active);
        subscription
            .apply(&UpdateSubscriptionRequest {
                status: Some(SubscriptionStatus::Canceled),
                ..Default::default()
            })
            .unwrap();
        assert!(subscription.canceled_at.is_some());

        subscription
            .apply(&UpdateSubscriptionRequest {
                status: Some(SubscriptionStatus::Active),
                amount: Some(59.0),
                ..Default::default()
            })
            .unwrap();
        assert!(subscription.canceled_at.is_none());
        assert_eq!(subscription.amount, 59.0);

        let negative = UpdateSubscriptionRequest {
            amount: Some(-5.0),
            ..Default::default()
        };
        assert!(subscription.apply(&negative).is_err());
    }

    #[test]
    fn test_overview_of_nothing() {
        let overview = billing_overview(&[]);
        assert_eq!(overview.mrr, 0.0);
        assert_eq!(overview.arr, 0.0);
        assert!(overview.plans.is_empty());
    }
}
