//! AdmissionReview wire types and pod-spec extraction.
//!
//! Only the subset of the `admission.k8s.io/v1` surface the webhook
//! consumes is modeled: the request UID, the raw object, and the
//! response envelope.

use serde::{Deserialize, Serialize};

use crate::error::WebhookError;

/// An `admission.k8s.io/v1` AdmissionReview request or response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionReview {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

/// The request half of an AdmissionReview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRequest {
    #[serde(default)]
    pub uid: String,
    /// The admitted object, kept raw until the kind is known.
    #[serde(default)]
    pub object: serde_json::Value,
}

/// The response half of an AdmissionReview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// Human-readable result status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub message: String,
}

impl AdmissionReview {
    /// Build a response review echoing the request UID.
    pub fn response(uid: &str, allowed: bool, message: &str) -> Self {
        AdmissionReview {
            api_version: "admission.k8s.io/v1".to_owned(),
            kind: "AdmissionReview".to_owned(),
            request: None,
            response: Some(AdmissionResponse {
                uid: uid.to_owned(),
                allowed,
                status: Some(Status {
                    message: message.to_owned(),
                }),
            }),
        }
    }
}

/// The pod-spec subset the webhook consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodSpec {
    #[serde(default, rename = "initContainers")]
    pub init_containers: Vec<Container>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default, rename = "ephemeralContainers")]
    pub ephemeral_containers: Vec<Container>,
}

/// One container entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

/// Extract the `PodSpec` from the raw admitted object.
///
/// Pods carry the spec directly; Deployment, ReplicaSet, StatefulSet,
/// DaemonSet, and Job carry it under `spec.template.spec`.
pub fn pod_spec_from_resource(object: &serde_json::Value) -> Result<PodSpec, WebhookError> {
    let kind = object.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
    let spec_value = match kind {
        "Pod" => object.get("spec"),
        "Deployment" | "ReplicaSet" | "StatefulSet" | "DaemonSet" | "Job" => object
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec")),
        _ => return Err(WebhookError::UnsupportedKind),
    };
    let spec_value = spec_value.ok_or(WebhookError::UnsupportedKind)?;
    serde_json::from_value(spec_value.clone())
        .map_err(|e| WebhookError::BadRequest(format!("decode pod spec: {e}")))
}
