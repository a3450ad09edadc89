use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;

use super::{non_blank, round_cents, ProfileSummary};

/// CRM pipeline stages, declared in pipeline order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadStage {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl LeadStage {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub stage: LeadStage,
    pub value: f64,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub owner_id: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn check_value(value: f64) -> Result<f64, &'static str> {
    if !value.is_finite() || value < 0.0 {
        return Err("value must be a non-negative amount");
    }
    Ok(round_cents(value))
}

impl Lead {
    pub fn from_request(req: &CreateLeadRequest) -> Result<Self, &'static str> {
        let company_name = non_blank(req.company_name.as_deref()).ok_or("company_name is required")?;
        let value = check_value(req.value.unwrap_or(0.0))?;
        let stage = req.stage.unwrap_or_default();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            company_name,
            contact_name: non_blank(req.contact_name.as_deref()),
            email: non_blank(req.email.as_deref()),
            phone: non_blank(req.phone.as_deref()),
            stage,
            value,
            source: non_blank(req.source.as_deref()),
            notes: non_blank(req.notes.as_deref()),
            owner_id: non_blank(req.owner_id.as_deref()),
            closed_at: stage.is_closed().then_some(now),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update, stamping `closed_at` when the lead is won or lost
    pub fn apply(&mut self, changes: &UpdateLeadRequest) -> Result<(), &'static str> {
        let now = Utc::now();
        if let Some(company_name) = changes.company_name.as_deref() {
            self.company_name = non_blank(Some(company_name)).ok_or("company_name cannot be empty")?;
        }
        if let Some(value) = changes.value {
            self.value = check_value(value)?;
        }
        if let Some(contact_name) = changes.contact_name.as_deref() {
            self.contact_name = non_blank(Some(contact_name));
        }
        if let Some(email) = changes.email.as_deref() {
            self.email = non_blank(Some(email));
        }
        if let Some(phone) = changes.phone.as_deref() {
            self.phone = non_blank(Some(phone));
        }
        if let Some(source) = changes.source.as_deref() {
            self.source = non_blank(Some(source));
        }
        if let Some(notes) = changes.notes.as_deref() {
            self.notes = non_blank(Some(notes));
        }
        if let Some(owner_id) = changes.owner_id.as_deref() {
            self.owner_id = non_blank(Some(owner_id));
        }
        if let Some(stage) = changes.stage {
            if stage != self.stage {
                self.closed_at = if stage.is_closed() { Some(now) } else { None };
            }
            self.stage = stage;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadView {
    #[serde(flatten)]
    pub lead: Lead,
    pub owner: Option<ProfileSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStage {
    pub stage: LeadStage,
    pub count: i64,
    pub total_value: f64,
}

/// Fold leads into one bucket per stage, in pipeline order, empty stages included
pub fn pipeline_summary(leads: &[Lead]) -> Vec<PipelineStage> {
    LeadStage::iter()
        .map(|stage| {
            let in_stage = leads.iter().filter(|l| l.stage == stage);
            let (count, total) = in_stage.fold((0i64, 0f64), |(c, t), l| (c + 1, t + l.value));
            PipelineStage {
                stage,
                count,
                total_value: round_cents(total),
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub stage: Option<LeadStage>,
    pub value: Option<f64>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLeadRequest {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub stage: Option<LeadStage>,
    pub value: Option<f64>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListLeadsQuery {
    pub stage: Option<LeadStage>,
    pub owner_id: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(stage: LeadStage, value: f64) -> Lead {
        Lead {
            id: uuid::Uuid::new_v4().to_string(),
            company_name: "Acme".to_string(),
            contact_name: None,
            email: None,
            phone: None,
            stage,
            value,
            source: None,
            notes: None,
            owner_id: None,
            closed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pipeline_summary_keeps_every_stage_in_order() {
        let leads = vec![
            lead(LeadStage::Won, 1200.0),
            lead(LeadStage::New, 100.0),
            lead(LeadStage::New, 250.5),
        ];
        let summary = pipeline_summary(&leads);

        assert_eq!(summary.len(), 7);
        assert_eq!(summary[0].stage, LeadStage::New);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].total_value, 350.5);
        assert_eq!(summary[1].count, 0);
        assert_eq!(summary[1].total_value, 0.0);
        assert_eq!(summary[5].stage, LeadStage::Won);
        assert_eq!(summary[5].total_value, 1200.0);
        assert_eq!(summary[6].stage, LeadStage::Lost);
    }

    #[test]
    fn test_stage_changes_stamp_closed_at() {
        let mut lead = lead(LeadStage::Negotiation, 500.0);

        lead.apply(&UpdateLeadRequest {
            stage: Some(LeadStage::Won),
            ..Default::default()
        })
        .unwrap();
        let closed_at = lead.closed_at.expect("won lead is closed");

        // same stage again keeps the original stamp
        lead.apply(&UpdateLeadRequest {
            stage: Some(LeadStage::Won),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(lead.closed_at, Some(closed_at));

        lead.apply(&UpdateLeadRequest {
            stage: Some(LeadStage::Qualified),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(lead.closed_at, None);
    }

    #[test]
    fn test_negative_value_rejected() {
        let mut lead = lead(LeadStage::New, 10.0);
        let result = lead.apply(&UpdateLeadRequest {
            value: Some(-1.0),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(lead.value, 10.0);

        let request = CreateLeadRequest {
            company_name: Some("Globex".to_string()),
            contact_name: None,
            email: None,
            phone: None,
            stage: Some(LeadStage::Lost),
            value: Some(99.999),
            source: None,
            notes: None,
            owner_id: None,
        };
        let created = Lead::from_request(&request).unwrap();
        assert_eq!(created.value, 100.0);
        assert!(created.closed_at.is_some());
    }

    #[test]
    fn test_closed_stages() {
        assert!(LeadStage::Won.is_closed());
        assert!(LeadStage::Lost.is_closed());
        assert!(!LeadStage::Negotiation.is_closed());
    }
}
