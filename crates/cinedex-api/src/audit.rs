//! Security audit logging for authentication events
//!
//! All audit events are logged at INFO level with the "audit" target, so
//! they can be filtered (`RUST_LOG=audit=info`) and routed separately from
//! application logs.
//!
//! # Example
//!
//! ```ignore
//! use cinedex_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.user_id.clone(),
//!     email: user.email.clone(),
//!     ip_address: client.ip_address.clone(),
//!     user_agent: client.user_agent.clone(),
//! });
//! ```
//!
//! Author: hephaex@gmail.com

use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user login
    LoginSuccess {
        user_id: String,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// New account created
    Signup {
        user_id: String,
        email: String,
        role: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Rejected signup
    SignupFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
    },

    /// Token pair refreshed
    TokenRefresh {
        user_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Authenticated caller lacks the required role
    AccessDenied {
        user_id: String,
        email: String,
        required_role: String,
        actual_role: String,
    },

    /// Missing, invalid or expired token at the gate
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },
}

/// Request metadata attached to audit events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
///
/// The full event is also attached as a JSON string (`event`) for log
/// aggregators.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            email,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "Login failed"
            );
        }
        AuditEvent::Signup {
            user_id,
            email,
            role,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                role = %role,
                ip_address = ?ip_address,
                "Signup successful"
            );
        }
        AuditEvent::SignupFailure {
            email,
            reason,
            ip_address,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "Signup failed"
            );
        }
        AuditEvent::TokenRefresh {
            user_id,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                ip_address = ?ip_address,
                "Token refresh"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            email,
            required_role,
            actual_role,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                required_role = %required_role,
                actual_role = %actual_role,
                "Access denied"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "Invalid token"
            );
        }
    }
}

/// Extract the client IP from proxy headers (X-Forwarded-For, then X-Real-IP)
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|xff| xff.to_str().ok())
        .and_then(|xff| xff.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|ip| ip.to_str().ok())
        .map(|ip| ip.to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::AccessDenied {
            user_id: "u-1".to_string(),
            email: "ada@example.com".to_string(),
            required_role: "ADMIN".to_string(),
            actual_role: "USER".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "access_denied");
        assert_eq!(json["required_role"], "ADMIN");
    }

    #[test]
    fn test_audit_log_does_not_panic() {
        audit_log(&AuditEvent::LoginFailure {
            email: "ada@example.com".to_string(),
            reason: "invalid credentials".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: None,
        });
        audit_log(&AuditEvent::InvalidToken {
            ip_address: None,
            user_agent: None,
            reason: "Token has expired".to_string(),
        });
    }

    #[test]
    fn test_client_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );
        headers.insert(
            axum::http::header::USER_AGENT,
            "Mozilla/5.0 (Test)".parse().unwrap(),
        );

        let client = ClientInfo::from_headers(&headers);
        assert_eq!(client.ip_address.as_deref(), Some("203.0.113.1"));
        assert_eq!(client.user_agent.as_deref(), Some("Mozilla/5.0 (Test)"));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_missing_headers() {
        let client = ClientInfo::from_headers(&HeaderMap::new());
        assert_eq!(client, ClientInfo::default());
    }
}
