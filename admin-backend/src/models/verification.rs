use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{non_blank, ProfileSummary};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub id: String,
    pub profile_id: String,
    pub business_name: String,
    pub registration_number: String,
    pub document_url: Option<String>,
    pub status: VerificationStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Verification {
    pub fn from_request(req: &SubmitVerificationRequest, profile_id: &str) -> Result<Self, &'static str> {
        let business_name = non_blank(req.business_name.as_deref()).ok_or("business_name is required")?;
        let registration_number =
            non_blank(req.registration_number.as_deref()).ok_or("registration_number is required")?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            profile_id: profile_id.to_string(),
            business_name,
            registration_number,
            document_url: non_blank(req.document_url.as_deref()),
            status: VerificationStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn review(&mut self, decision: ReviewDecision, reviewer_id: &str) {
        let now = Utc::now();
        self.status = decision.status;
        self.rejection_reason = decision.rejection_reason;
        self.reviewed_by = Some(reviewer_id.to_string());
        self.reviewed_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationView {
    #[serde(flatten)]
    pub verification: Verification,
    pub profile: Option<ProfileSummary>,
    pub reviewer: Option<ProfileSummary>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitVerificationRequest {
    pub business_name: Option<String>,
    pub registration_number: Option<String>,
    pub document_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewVerificationRequest {
    pub status: Option<VerificationStatus>,
    pub rejection_reason: Option<String>,
}

/// A validated review outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDecision {
    pub status: VerificationStatus,
    pub rejection_reason: Option<String>,
}

impl ReviewVerificationRequest {
    pub fn decision(&self) -> Result<ReviewDecision, &'static str> {
        let reason = non_blank(self.rejection_reason.as_deref());
        match self.status {
            None => Err("status is required"),
            Some(VerificationStatus::Pending) => Err("status must be approved or rejected"),
            Some(VerificationStatus::Rejected) if reason.is_none() => {
                Err("rejection_reason is required when rejecting")
            }
            Some(VerificationStatus::Rejected) => Ok(ReviewDecision {
                status: VerificationStatus::Rejected,
                rejection_reason: reason,
            }),
            Some(VerificationStatus::Approved) => Ok(ReviewDecision {
                status: VerificationStatus::Approved,
                rejection_reason: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListVerificationsQuery {
    pub status: Option<VerificationStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(status: Option<VerificationStatus>, reason: Option<&str>) -> ReviewVerificationRequest {
        ReviewVerificationRequest {
            status,
            rejection_reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_rejection_requires_reason() {
        assert!(review(Some(VerificationStatus::Rejected), None).decision().is_err());
        assert!(review(Some(VerificationStatus::Rejected), Some("  ")).decision().is_err());

        let decision = review(Some(VerificationStatus::Rejected), Some(" expired license "))
            .decision()
            .unwrap();
        assert_eq!(decision.rejection_reason.as_deref(), Some("expired license"));
    }

    #[test]
    fn test_approval_drops_reason() {
        let decision = review(Some(VerificationStatus::Approved), Some("n/a")).decision().unwrap();
        assert_eq!(decision.status, VerificationStatus::Approved);
        assert_eq!(decision.rejection_reason, None);
    }

    #[test]
    fn test_review_stamps_reviewer() {
        let request = SubmitVerificationRequest {
            business_name: Some("Acme Ltd".to_string()),
            registration_number: Some("RC-1029".to_string()),
            document_url: Some("".to_string()),
        };
        let mut verification = Verification::from_request(&request, "owner").unwrap();
        assert_eq!(verification.status, VerificationStatus::Pending);
        assert_eq!(verification.document_url, None);

        let decision = review(Some(VerificationStatus::Rejected), Some("blurry scan"))
            .decision()
            .unwrap();
        verification.review(decision, "admin");
        assert_eq!(verification.status, VerificationStatus::Rejected);
        assert_eq!(verification.reviewed_by.as_deref(), Some("admin"));
        assert!(verification.reviewed_at.is_some());
        assert_eq!(verification.rejection_reason.as_deref(), Some("blurry scan"));
    }

    #[test]
    fn test_pending_and_missing_status_rejected() {
        assert!(review(Some(VerificationStatus::Pending), None).decision().is_err());
        assert!(review(None, None).decision().is_err());
    }
}
