//! Customer-facing estimate links
//!
//! A link hands the customer a random token; only its SHA-256 digest is
//! stored. Each link also carries a short code that can be read out over
//! the phone.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{ShopError, ShopResult};
use crate::models::{
    ApprovalStatus, Estimate, EstimateComment, EstimateId, EstimatePublicLink, EstimateSignature,
    EstimateStatus, JobId, PublicLinkId,
};
use crate::storage::Storage;

use super::{ensure_unlocked, today};

const TOKEN_LENGTH: usize = 48;
const SHORT_CODE_LENGTH: usize = 8;
const SHORT_CODE_ATTEMPTS: usize = 16;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Actor recorded in the audit log for customer actions
const CUSTOMER: &str = "customer";

fn generate_secret(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Hex-encoded SHA-256 digest of a raw token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// A freshly issued link together with the raw token
///
/// The token is only available here; it cannot be recovered later.
#[derive(Debug, Clone)]
pub struct IssuedLink {
    pub link: EstimatePublicLink,
    pub token: String,
}

pub struct EstimatePublicLinkService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> EstimatePublicLinkService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Issue a new link for an estimate awaiting a decision
    ///
    /// Earlier active links for the same estimate are revoked. A pending
    /// estimate is marked sent.
    pub fn issue(&self, estimate_id: EstimateId) -> ShopResult<IssuedLink> {
        let mut estimate = self.load_estimate(estimate_id)?;
        ensure_unlocked(&estimate)?;
        if !estimate.status.awaiting_decision() {
            return Err(ShopError::Validation(format!(
                "Estimate {} is {}; links can only be issued while it awaits a decision",
                estimate.number, estimate.status
            )));
        }
        if estimate.is_past_expiration(today()) {
            return Err(ShopError::Validation(format!(
                "Estimate {} is past its expiration date",
                estimate.number
            )));
        }

        let now = Utc::now();
        let superseded = self
            .storage
            .public_links
            .active_for_estimate(estimate_id, now)?;

        let token = generate_secret(TOKEN_LENGTH);
        let short_code = self.unique_short_code()?;
        let expires_at = now + Duration::hours(i64::from(self.settings.public_link_ttl_hours));
        let link = EstimatePublicLink::new(estimate_id, hash_token(&token), short_code, expires_at);

        let mut revoked = Vec::with_capacity(superseded.len());
        for previous in &superseded {
            let mut old = previous.clone();
            old.revoke();
            self.storage.public_links.upsert(old.clone())?;
            revoked.push(old);
        }
        if let Err(e) = self.storage.public_links.commit(link.clone()) {
            for previous in superseded {
                self.storage.public_links.restore(previous.id, Some(previous))?;
            }
            return Err(e);
        }

        let estimate_before = estimate.clone();
        if estimate.status == EstimateStatus::Pending {
            estimate
                .transition(EstimateStatus::Sent)
                .map_err(|(from, to)| ShopError::transition("Estimate", from, to))?;
            if let Err(e) = self.storage.estimates.commit(estimate.clone()) {
                self.storage.public_links.restore(link.id, None)?;
                for previous in superseded {
                    self.storage.public_links.restore(previous.id, Some(previous))?;
                }
                self.storage.public_links.save()?;
                return Err(e);
            }
            self.storage.log_update(
                EntityType::Estimate,
                estimate.id.to_string(),
                Some(estimate.number.clone()),
                &estimate_before,
                &estimate,
                None,
            )?;
        }

        for (before, after) in superseded.iter().zip(&revoked) {
            self.storage.log_update(
                EntityType::PublicLink,
                after.id.to_string(),
                Some(after.short_code.clone()),
                before,
                after,
                Some("superseded by a new link".into()),
            )?;
        }
        self.storage.log_create(
            EntityType::PublicLink,
            link.id.to_string(),
            Some(link.short_code.clone()),
            &link,
        )?;

        info!(
            estimate = %estimate.number,
            link = %link.id,
            expires_at = %link.expires_at,
            revoked = revoked.len(),
            "public link issued"
        );
        Ok(IssuedLink { link, token })
    }

    /// Resolve a raw token or short code to its link and estimate
    ///
    /// Every successful resolution counts as an access.
    pub fn resolve(&self, token: &str) -> ShopResult<(EstimatePublicLink, Estimate)> {
        let now = Utc::now();
        let mut link = self.live_link(token, now)?;
        let estimate = self.load_estimate(link.estimate_id)?;

        link.record_access(now);
        self.storage.public_links.commit(link.clone())?;
        debug!(link = %link.id, count = link.access_count, "public link accessed");

        Ok((link, estimate))
    }

    /// The estimate behind a live token, without counting an access
    pub fn peek_estimate(&self, token: &str) -> ShopResult<Estimate> {
        let link = self.live_link(token, Utc::now())?;
        self.load_estimate(link.estimate_id)
    }

    /// Look up a token and refuse it when revoked or past its expiry
    fn live_link(&self, token: &str, now: DateTime<Utc>) -> ShopResult<EstimatePublicLink> {
        let link = self.lookup(token)?;
        if link.is_revoked() {
            warn!(link = %link.id, "revoked public link used");
            return Err(ShopError::LinkRevoked);
        }
        if link.is_expired_at(now) {
            warn!(link = %link.id, "expired public link used");
            return Err(ShopError::LinkExpired);
        }
        Ok(link)
    }

    fn lookup(&self, token: &str) -> ShopResult<EstimatePublicLink> {
        let token = token.trim();
        let found = if token.len() == SHORT_CODE_LENGTH {
            self.storage.public_links.get_by_short_code(token)?
        } else {
            self.storage.public_links.get_by_token_hash(&hash_token(token))?
        };
        found.ok_or_else(|| ShopError::link_not_found("(token)"))
    }

    pub fn find(&self, identifier: &str) -> ShopResult<Option<EstimatePublicLink>> {
        self.storage.public_links.find(identifier)
    }

    pub fn list_for_estimate(
        &self,
        estimate_id: EstimateId,
    ) -> ShopResult<Vec<EstimatePublicLink>> {
        self.storage.public_links.for_estimate(estimate_id)
    }

    pub fn revoke(&self, id: PublicLinkId) -> ShopResult<EstimatePublicLink> {
        let mut link = self
            .storage
            .public_links
            .get(id)?
            .ok_or_else(|| ShopError::link_not_found(id.to_string()))?;
        if link.is_revoked() {
            return Err(ShopError::LinkRevoked);
        }

        let before = link.clone();
        link.revoke();
        self.storage.public_links.commit(link.clone())?;
        self.storage.log_update(
            EntityType::PublicLink,
            link.id.to_string(),
            Some(link.short_code.clone()),
            &before,
            &link,
            None,
        )?;

        info!(link = %link.id, "public link revoked");
        Ok(link)
    }

    pub fn approve_job(&self, token: &str, job_id: JobId) -> ShopResult<Estimate> {
        self.customer_action(token, "approve job", true, |estimate| {
            let job = estimate
                .job_mut(job_id)
                .ok_or_else(|| ShopError::job_not_found(job_id.to_string()))?;
            job.decide(ApprovalStatus::Approved, None);
            Ok(())
        })
    }

    pub fn reject_job(
        &self,
        token: &str,
        job_id: JobId,
        reason: Option<String>,
    ) -> ShopResult<Estimate> {
        let reason = reason.filter(|r| !r.trim().is_empty());
        self.customer_action(token, "reject job", true, |estimate| {
            let job = estimate
                .job_mut(job_id)
                .ok_or_else(|| ShopError::job_not_found(job_id.to_string()))?;
            job.decide(ApprovalStatus::Rejected, reason);
            Ok(())
        })
    }

    /// Record the customer's signature once every job has been decided
    ///
    /// `signature_data` is base64, optionally as a `data:` URL.
    pub fn sign(
        &self,
        token: &str,
        signer_name: &str,
        signature_data: &str,
    ) -> ShopResult<Estimate> {
        let signer_name = signer_name.trim();
        if signer_name.is_empty() {
            return Err(ShopError::Validation("Signer name is required".into()));
        }
        let data = signature_data.trim();
        let encoded = data
            .split_once(";base64,")
            .map_or(data, |(_, payload)| payload);
        match STANDARD.decode(encoded) {
            Ok(bytes) if !bytes.is_empty() => {}
            _ => {
                return Err(ShopError::Validation(
                    "Signature data must be non-empty base64".into(),
                ))
            }
        }

        self.customer_action(token, "sign", false, |estimate| {
            if estimate.has_pending_jobs() {
                return Err(ShopError::Validation(
                    "Every job must be approved or rejected before signing".into(),
                ));
            }
            if estimate.signature.is_some() {
                return Err(ShopError::Duplicate {
                    entity_type: "Signature",
                    identifier: estimate.number.clone(),
                });
            }
            estimate.signature = Some(EstimateSignature {
                signer_name: signer_name.to_string(),
                signature_data: data.to_string(),
                signed_at: Utc::now(),
            });
            Ok(())
        })
    }

    pub fn comment(&self, token: &str, author: &str, body: &str) -> ShopResult<Estimate> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ShopError::Validation("Comment cannot be empty".into()));
        }
        let author = match author.trim() {
            "" => CUSTOMER,
            name => name,
        };

        self.customer_action(token, "comment", false, |estimate| {
            estimate.comments.push(EstimateComment {
                author: author.to_string(),
                body: body.to_string(),
                from_customer: true,
                created_at: Utc::now(),
            });
            Ok(())
        })
    }

    /// Resolve the token, check the estimate still accepts customer input,
    /// apply `change` and persist
    ///
    /// Nothing is accepted once the estimate has moved on to a workorder or
    /// invoice. Job decisions need an estimate that is still pending or
    /// sent; signatures and comments are also taken once everything is
    /// decided. An undecided
    /// estimate found past its expiration date is marked expired and the
    /// action is refused.
    fn customer_action<F>(
        &self,
        token: &str,
        action: &str,
        is_decision: bool,
        change: F,
    ) -> ShopResult<Estimate>
    where
        F: FnOnce(&mut Estimate) -> ShopResult<()>,
    {
        let (_, mut estimate) = self.resolve(token)?;

        if let Err(e) = ensure_unlocked(&estimate) {
            warn!(estimate = %estimate.number, action, "customer action on locked estimate");
            return Err(e);
        }
        let open = match estimate.status {
            EstimateStatus::Pending | EstimateStatus::Sent => true,
            EstimateStatus::Approved | EstimateStatus::Rejected => !is_decision,
            EstimateStatus::Expired | EstimateStatus::Converted => false,
        };
        if !open {
            warn!(
                estimate = %estimate.number,
                status = %estimate.status,
                action,
                "customer action refused"
            );
            return Err(ShopError::Locked(format!(
                "Estimate {} is {} and no longer accepts this change",
                estimate.number, estimate.status
            )));
        }

        if estimate.status.awaiting_decision() && estimate.is_past_expiration(today()) {
            let before = estimate.clone();
            estimate
                .transition(EstimateStatus::Expired)
                .map_err(|(from, to)| ShopError::transition("Estimate", from, to))?;
            self.storage.estimates.commit(estimate.clone())?;
            self.storage.log_update_by(
                EntityType::Estimate,
                estimate.id.to_string(),
                Some(estimate.number.clone()),
                &before,
                &estimate,
                None,
                Some(CUSTOMER),
            )?;
            warn!(estimate = %estimate.number, action, "customer action on expired estimate");
            return Err(ShopError::Locked(format!(
                "Estimate {} has expired",
                estimate.number
            )));
        }

        let before = estimate.clone();
        change(&mut estimate)?;
        if let Some(previous) = estimate.normalize() {
            info!(
                estimate = %estimate.number,
                from = %previous,
                to = %estimate.status,
                "estimate status re-derived after customer decision"
            );
        }

        self.storage.estimates.commit(estimate.clone())?;
        self.storage.log_update_by(
            EntityType::Estimate,
            estimate.id.to_string(),
            Some(estimate.number.clone()),
            &before,
            &estimate,
            Some(format!("customer {}", action)),
            Some(CUSTOMER),
        )?;

        Ok(estimate)
    }

    fn unique_short_code(&self) -> ShopResult<String> {
        for _ in 0..SHORT_CODE_ATTEMPTS {
            let code = generate_secret(SHORT_CODE_LENGTH);
            if !self.storage.public_links.short_code_exists(&code)? {
                return Ok(code);
            }
        }
        Err(ShopError::Storage(
            "Could not generate a unique short code".into(),
        ))
    }

    fn load_estimate(&self, id: EstimateId) -> ShopResult<Estimate> {
        self.storage
            .estimates
            .get(id)?
            .ok_or_else(|| ShopError::estimate_not_found(id.to_string()))
    }
}
