use serde::Serialize;

/// Headline numbers for the dashboard landing page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users: i64,
    pub open_tasks: i64,
    pub open_tickets: i64,
    pub pending_verifications: i64,
    pub open_leads: i64,
    pub won_leads: i64,
    pub attendance_today: i64,
    pub active_subscriptions: i64,
    pub mrr: f64,
    pub generated_at: String,
}
