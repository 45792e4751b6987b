//! Admission review envelope and the decision logic around the core calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use pkg_admission::kind::FailurePolicy;
use pkg_admission::{AdmissionController, AdmissionObject, Operation, ResourceKind, Verdict};

/// Inbound admission request for one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub uid: String,
    pub operation: Operation,
    /// Absent on DELETE.
    #[serde(default)]
    pub object: Option<Value>,
    #[serde(default)]
    pub old_object: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The object after defaulting; only set by mutating reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Mutate,
    Validate,
}

impl ReviewResponse {
    fn allowed(uid: String) -> Self {
        Self {
            uid,
            allowed: true,
            message: None,
            object: None,
        }
    }

    fn denied(uid: String, message: String) -> Self {
        Self {
            uid,
            allowed: false,
            message: Some(message),
            object: None,
        }
    }
}

/// Run one admission phase for `kind` and build the response.
pub async fn review(
    controller: &AdmissionController,
    kind: ResourceKind,
    phase: Phase,
    request: ReviewRequest,
) -> ReviewResponse {
    let ReviewRequest {
        uid,
        operation,
        object,
        old_object,
    } = request;

    if operation == Operation::Delete {
        debug!("Admitting DELETE of {} ({})", kind, uid);
        return ReviewResponse::allowed(uid);
    }

    let Some(mut raw) = object else {
        return ReviewResponse::denied(uid, format!("{} request carries no object", kind));
    };
    let mut object = match AdmissionObject::decode(kind, raw.clone()) {
        Ok(o) => o,
        Err(e) => return ReviewResponse::denied(uid, format!("invalid {} object: {}", kind, e)),
    };
    let old_object = match old_object.map(|v| AdmissionObject::decode(kind, v)).transpose() {
        Ok(o) => o,
        Err(e) => return ReviewResponse::denied(uid, format!("invalid old {} object: {}", kind, e)),
    };

    match phase {
        // The response carries the object as received, plus the tag if one was written.
        Phase::Mutate => {
            let result = match controller.mutate(operation, &mut object).await {
                Ok(true) => object.write_tags_to(&mut raw).map_err(anyhow::Error::from),
                Ok(false) => Ok(()),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => ReviewResponse {
                    object: Some(raw),
                    ..ReviewResponse::allowed(uid)
                },
                Err(e) => on_failure(kind, uid, e),
            }
        }
        Phase::Validate => match controller.validate(operation, &object, old_object.as_ref()).await {
            Ok(Verdict::Allowed) => ReviewResponse::allowed(uid),
            Ok(Verdict::Denied(reason)) => ReviewResponse::denied(uid, reason),
            Err(e) => on_failure(kind, uid, e),
        },
    }
}

/// Apply the entry point's failure policy to an infrastructure error.
fn on_failure(kind: ResourceKind, uid: String, err: anyhow::Error) -> ReviewResponse {
    let message = format!("{:#}", err);
    match kind.failure_policy() {
        FailurePolicy::Ignore => {
            warn!("Admission of {} failed, allowing ({}): {}", kind, uid, message);
            ReviewResponse {
                message: Some(message),
                ..ReviewResponse::allowed(uid)
            }
        }
        FailurePolicy::Fail => {
            warn!("Admission of {} failed, denying ({}): {}", kind, uid, message);
            ReviewResponse::denied(uid, message)
        }
    }
}
