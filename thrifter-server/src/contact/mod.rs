//! Contact form: public submission plus an admin listing with day-granular
//! date filters.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Deserialize;

use thrifter_core::ApiResponse;
use thrifter_core::api_types::Page;
use thrifter_core::auth::{ContactFilter, ContactRepository};
use thrifter_core::domain::contact::{Contact, NewContact};

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListContactsQuery {
    /// Inclusive `YYYY-MM-DD` lower bound.
    pub start_date: Option<String>,
    /// Inclusive `YYYY-MM-DD` upper bound.
    pub end_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn parse_day(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("{field} must be formatted as YYYY-MM-DD")))
}

fn start_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

/// Exclusive upper bound for an inclusive end date: the following midnight.
/// `None` when the date sits at the calendar maximum.
fn end_of_day_exclusive(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.checked_add_signed(TimeDelta::days(1))
        .and_then(start_of_day)
}

/// `POST /contact` (public)
pub async fn create_contact(
    State(state): State<AppState>,
    Json(submission): Json<NewContact>,
) -> AppResult<(StatusCode, Json<ApiResponse<Contact>>)> {
    submission.validate()?;

    let contact = state.contacts.insert(&submission.normalized()).await?;
    tracing::info!(contact_id = %contact.id, "contact form submitted");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(contact)
                .with_message("Thanks for reaching out. We'll get back to you soon.".to_string()),
        ),
    ))
}

/// `GET /contact` (admin)
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListContactsQuery>,
) -> AppResult<Json<ApiResponse<Page<Contact>>>> {
    let created_after = query
        .start_date
        .as_deref()
        .map(|raw| parse_day(raw, "start_date"))
        .transpose()?
        .and_then(start_of_day);

    // end_date is inclusive: filter strictly before the following midnight.
    let created_before = match query.end_date.as_deref() {
        Some(raw) => {
            let day = parse_day(raw, "end_date")?;
            Some(
                end_of_day_exclusive(day)
                    .ok_or_else(|| AppError::bad_request("end_date is out of range"))?,
            )
        }
        None => None,
    };

    if let (Some(after), Some(before)) = (created_after, created_before)
        && after >= before
    {
        return Err(AppError::bad_request("start_date must not be after end_date"));
    }

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let filter = ContactFilter {
        created_after,
        created_before,
        limit,
        offset,
    };

    let (items, total) = state.contacts.list(&filter).await?;
    tracing::debug!(total, returned = items.len(), "listed contacts");

    Ok(Json(ApiResponse::success(Page {
        total,
        limit,
        offset,
        items,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_bound_is_the_following_midnight() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let bound = end_of_day_exclusive(day).unwrap();
        assert_eq!(bound.to_rfc3339(), "2026-08-30T00:00:00+00:00");
    }

    #[test]
    fn end_bound_refuses_the_calendar_maximum() {
        assert!(end_of_day_exclusive(NaiveDate::MAX).is_none());
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_day("2026-08-29", "start_date").is_ok());
        assert!(parse_day("29/08/2026", "start_date").is_err());
        assert!(parse_day("not-a-date", "end_date").is_err());
    }
}
