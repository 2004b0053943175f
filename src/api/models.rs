// API request/response models (DTOs)

use serde::{Deserialize, Serialize};

use crate::catalog::PopulateSummary;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

/// Error body for CRUD and search failures
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Body returned after a delete
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: i64,
}

/// Successful catalog import
#[derive(Debug, Serialize, Deserialize)]
pub struct PopulateResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
}

impl From<&PopulateSummary> for PopulateResponse {
    fn from(summary: &PopulateSummary) -> Self {
        Self {
            success: true,
            message: summary.message(),
            count: summary.processed,
        }
    }
}

/// Failed catalog import (fetch stage)
#[derive(Debug, Serialize, Deserialize)]
pub struct PopulateFailure {
    pub success: bool,
    pub error: String,
    pub details: String,
}

impl PopulateFailure {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            success: false,
            error: "Failed to populate database".to_string(),
            details: details.into(),
        }
    }
}
